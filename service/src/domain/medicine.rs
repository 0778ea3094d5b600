//! [`Medicine`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::define_text;

/// Medicine batch kept in the clinic stock.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Medicine {
    /// ID of this [`Medicine`].
    pub id: Id,

    /// [`Name`] of this [`Medicine`].
    pub name: Name,

    /// [`Dose`] of a single package of this [`Medicine`].
    pub dose: Dose,

    /// [`Unit`] the [`Dose`] is measured in.
    pub unit: Unit,

    /// Number of packages left in the stock.
    pub amount: Amount,

    /// [`DateTime`] when this [`Medicine`] expires.
    pub expires_at: ExpirationDateTime,

    /// [`DateTime`] when this [`Medicine`] was received by the clinic.
    pub received_at: ReceptionDateTime,

    /// [`Manufacturer`] of this [`Medicine`].
    pub manufacturer: Manufacturer,

    /// [`BatchNumber`] of this [`Medicine`].
    pub batch_number: BatchNumber,

    /// [`FactorType`] of this [`Medicine`].
    pub factor_type: FactorType,

    /// [`DateTime`] when this [`Medicine`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Medicine`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_text! {
    #[doc = "Name of a [`Medicine`]."]
    Name(max = 256)
}

define_text! {
    #[doc = "Unit of a [`Medicine`] [`Dose`]."]
    Unit(max = 32)
}

define_text! {
    #[doc = "Manufacturer of a [`Medicine`]."]
    Manufacturer(max = 256)
}

define_text! {
    #[doc = "Batch number of a [`Medicine`]."]
    BatchNumber(max = 128)
}

define_text! {
    #[doc = "Coagulation factor type of a [`Medicine`]."]
    FactorType(max = 64)
}

/// Dose of a single [`Medicine`] package.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Dose(i32);

impl Dose {
    /// Creates a new [`Dose`] if the given `dose` is positive.
    #[must_use]
    pub const fn new(dose: i32) -> Option<Self> {
        if dose > 0 {
            Some(Self(dose))
        } else {
            None
        }
    }
}

/// Number of [`Medicine`] packages.
///
/// Never negative.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
#[serde(try_from = "i32")]
pub struct Amount(i32);

impl Amount {
    /// Zero [`Amount`].
    pub const ZERO: Self = Self(0);

    /// Creates a new [`Amount`] if the given `amount` is not negative.
    #[must_use]
    pub const fn new(amount: i32) -> Option<Self> {
        if amount >= 0 {
            Some(Self(amount))
        } else {
            None
        }
    }

    /// Returns the raw value of this [`Amount`].
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Adds the `other` [`Amount`] to this one.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Subtracts the `other` [`Amount`] from this one.
    ///
    /// [`None`] is returned if the result would be negative.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).and_then(Self::new)
    }

    /// Returns this [`Amount`] as a number of items.
    #[must_use]
    pub fn count(self) -> usize {
        usize::try_from(self.0).unwrap_or_default()
    }
}

impl TryFrom<i32> for Amount {
    type Error = &'static str;

    fn try_from(amount: i32) -> Result<Self, Self::Error> {
        Self::new(amount).ok_or("negative `Amount`")
    }
}

/// [`DateTime`] when a [`Medicine`] was created.
pub type CreationDateTime = DateTimeOf<(Medicine, unit::Creation)>;

/// [`DateTime`] when a [`Medicine`] expires.
pub type ExpirationDateTime = DateTimeOf<(Medicine, unit::Expiration)>;

/// [`DateTime`] when a [`Medicine`] was received by the clinic.
pub type ReceptionDateTime = DateTimeOf<(Medicine, unit::Reception)>;
