//! [`Permissions`] definitions.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{fmt, ops};

#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::domain::Account;

/// Set of capabilities granted to an [`Account`], stored as a bitmask.
#[derive(
    Clone, Copy, Default, Deserialize, Eq, Hash, PartialEq, Serialize,
)]
#[serde(transparent)]
pub struct Permissions(u64);

impl Permissions {
    /// Empty set.
    pub const NONE: Self = Self(0);

    /// Reading other [`Account`]s.
    pub const READ_ACCOUNTS: Self = Self(1 << 0);
    /// Creating, modifying and deleting other [`Account`]s.
    pub const WRITE_ACCOUNTS: Self = Self(1 << 1);
    /// Reading patients.
    pub const READ_PATIENT: Self = Self(1 << 2);
    /// Modifying patients.
    pub const WRITE_PATIENT: Self = Self(1 << 3);
    /// Reading medicines.
    pub const READ_MEDICINE: Self = Self(1 << 4);
    /// Modifying medicines.
    pub const WRITE_MEDICINE: Self = Self(1 << 5);
    /// Reading viruses.
    pub const READ_VIRUS: Self = Self(1 << 6);
    /// Modifying viruses.
    pub const WRITE_VIRUS: Self = Self(1 << 7);
    /// Reading blood tests.
    pub const READ_BLOOD_TEST: Self = Self(1 << 8);
    /// Modifying blood tests.
    pub const WRITE_BLOOD_TEST: Self = Self(1 << 9);
    /// Reading own visits.
    pub const READ_OWN_VISIT: Self = Self(1 << 10);
    /// Modifying own visits.
    pub const WRITE_OWN_VISIT: Self = Self(1 << 11);
    /// Reading visits of anyone.
    pub const READ_OTHER_VISITS: Self = Self(1 << 12);
    /// Modifying visits of anyone.
    pub const WRITE_OTHER_VISITS: Self = Self(1 << 13);
    /// Reading diagnoses.
    pub const READ_DIAGNOSES: Self = Self(1 << 14);
    /// Modifying diagnoses.
    pub const WRITE_DIAGNOSES: Self = Self(1 << 15);

    /// Every known capability.
    pub const ALL: Self = Self((1 << 16) - 1);

    /// Preset of a patient.
    pub const PATIENT: Self =
        Self::READ_OWN_VISIT.union(Self::WRITE_OWN_VISIT);

    /// Preset of a secretary.
    pub const SECRETARY: Self = Self::READ_PATIENT
        .union(Self::WRITE_PATIENT)
        .union(Self::READ_MEDICINE)
        .union(Self::WRITE_MEDICINE)
        .union(Self::READ_OTHER_VISITS)
        .union(Self::WRITE_OTHER_VISITS)
        .union(Self::READ_BLOOD_TEST)
        .union(Self::READ_VIRUS)
        .union(Self::READ_DIAGNOSES);

    /// Preset of an administrator.
    pub const ADMIN: Self = Self::SECRETARY
        .union(Self::READ_ACCOUNTS)
        .union(Self::WRITE_ACCOUNTS)
        .union(Self::READ_BLOOD_TEST)
        .union(Self::WRITE_BLOOD_TEST)
        .union(Self::READ_VIRUS)
        .union(Self::WRITE_VIRUS)
        .union(Self::READ_DIAGNOSES)
        .union(Self::WRITE_DIAGNOSES);

    /// Creates [`Permissions`] from raw bits, dropping unknown ones.
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Returns the raw bits of these [`Permissions`].
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns the union of these and the `other` [`Permissions`].
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Checks whether these and the `other` [`Permissions`] share any bit.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Checks whether these [`Permissions`] include every bit of the `other`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Checks whether these [`Permissions`] are empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the single-bit [`Permissions`] contained in these ones.
    pub fn iter(self) -> impl Iterator<Item = Self> {
        (0..u64::BITS)
            .map(|n| Self(1 << n))
            .filter(move |bit| self.contains(*bit))
    }
}

impl fmt::Debug for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Permissions({:#018b})", self.0)
    }
}

impl ops::BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl ops::BitOrAssign for Permissions {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl ops::BitAnd for Permissions {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

// Stored as `BIGINT`, so the bits are reinterpreted as a signed integer.
#[cfg(feature = "postgres")]
impl FromSql<'_> for Permissions {
    accepts!(INT8);

    #[expect(clippy::cast_sign_loss, reason = "bit reinterpretation")]
    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        Ok(Self::from_bits(i64::from_sql(ty, raw)? as u64))
    }
}

#[cfg(feature = "postgres")]
impl ToSql for Permissions {
    accepts!(INT8);
    to_sql_checked!();

    #[expect(clippy::cast_possible_wrap, reason = "bit reinterpretation")]
    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        (self.0 as i64).to_sql(ty, w)
    }
}

#[cfg(test)]
mod spec {
    use super::Permissions;

    #[test]
    fn bits_are_distinct_and_ordered() {
        let bits = Permissions::ALL.iter().collect::<Vec<_>>();

        assert_eq!(bits.len(), 16);
        assert_eq!(bits[0], Permissions::READ_ACCOUNTS);
        assert_eq!(bits[10], Permissions::READ_OWN_VISIT);
        assert_eq!(bits[15], Permissions::WRITE_DIAGNOSES);
    }

    #[test]
    fn presets_nest() {
        assert!(Permissions::ADMIN.contains(Permissions::SECRETARY));
        assert!(!Permissions::SECRETARY.contains(Permissions::PATIENT));
        assert!(!Permissions::SECRETARY.intersects(Permissions::WRITE_ACCOUNTS));
        assert!(Permissions::SECRETARY.contains(Permissions::READ_DIAGNOSES));
        assert!(!Permissions::SECRETARY.intersects(Permissions::WRITE_VIRUS));
        assert!(Permissions::ALL.contains(Permissions::ADMIN));
        assert!(!Permissions::ADMIN.intersects(Permissions::PATIENT));
    }

    #[test]
    fn unknown_bits_are_dropped() {
        assert_eq!(Permissions::from_bits(u64::MAX), Permissions::ALL);
        assert!(Permissions::from_bits(1 << 40).is_empty());
    }
}
