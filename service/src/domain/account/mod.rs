//! [`Account`] definitions.

pub mod permission;
pub mod session;

use std::sync::LazyLock;

use argon2::{
    password_hash::{
        self, rand_core::OsRng, PasswordHasher as _, PasswordVerifier as _,
        SaltString,
    },
    Argon2,
};
#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::define_text;

pub use self::{permission::Permissions, session::Session};

/// Clinic staff or patient account.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Account {
    /// ID of this [`Account`].
    pub id: Id,

    /// [`DisplayName`] of this [`Account`].
    pub display_name: DisplayName,

    /// Unique [`Username`] of this [`Account`].
    pub username: Username,

    /// [`PasswordHash`] of this [`Account`].
    pub password_hash: PasswordHash,

    /// [`Kind`] of this [`Account`].
    pub kind: Kind,

    /// [`Permissions`] granted to this [`Account`].
    pub permissions: Permissions,

    /// [`DateTime`] when this [`Account`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Account`] was last modified.
    pub updated_at: ModificationDateTime,
}

impl Account {
    /// Checks whether this [`Account`] holds any of the provided
    /// [`Permissions`].
    ///
    /// [`Kind::SuperAdmin`] passes every check regardless of its stored
    /// [`Permissions`].
    #[must_use]
    pub fn has_permission(&self, required: Permissions) -> bool {
        self.kind == Kind::SuperAdmin || self.permissions.intersects(required)
    }
}

/// ID of an [`Account`].
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
    PartialEq,
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
    #[doc = "Human-readable name of an [`Account`]."]
    DisplayName(max = 256)
}

/// Username of an [`Account`], used to log in.
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[serde(transparent)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Username(String);

impl Username {
    /// Creates a new [`Username`] if the given `username` is valid.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Option<Self> {
        let username = username.into();
        Self::check(&username).then_some(Self(username))
    }

    /// Checks whether the given `username` is a valid [`Username`].
    fn check(username: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Username`] invariants:
        /// - Must not be empty;
        /// - Must contain only letters, digits, `_`, `-` and `.`;
        /// - Must be at most 64 characters long.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[\p{L}\p{N}_.\-]{1,64}$").expect("valid regex")
        });

        REGEX.is_match(username.as_ref())
    }
}

impl std::str::FromStr for Username {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Username`")
    }
}

/// Plain-text password of an [`Account`].
#[derive(Clone, Debug, Display, Eq, From, PartialEq)]
#[from(&str, String)]
pub struct Password(String);

impl Password {
    /// Creates a new [`Password`] if the given `password` is valid.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        Self::check(&password).then_some(Self(password))
    }

    /// Checks whether the given `password` is a valid [`Password`].
    fn check(password: impl AsRef<str>) -> bool {
        let password = password.as_ref();
        !password.is_empty() && password.len() <= 128
    }
}

impl std::str::FromStr for Password {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Password`")
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// [Argon2] hash of an [`Account`] [`Password`] in the PHC string format.
///
/// [Argon2]: https://en.wikipedia.org/wiki/Argon2
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hashes the provided [`Password`] with a freshly generated salt.
    ///
    /// # Errors
    ///
    /// If [Argon2] fails to hash the [`Password`].
    ///
    /// [Argon2]: https://en.wikipedia.org/wiki/Argon2
    pub fn new(password: &Password) -> Result<Self, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.0.as_bytes(), &salt)
            .map(|h| Self(h.to_string()))
            .map_err(HashError)
    }

    /// Checks whether the provided [`Password`] matches this [`PasswordHash`].
    ///
    /// A malformed stored hash never matches.
    #[must_use]
    pub fn verify(&self, password: &Password) -> bool {
        password_hash::PasswordHash::new(&self.0).is_ok_and(|hash| {
            Argon2::default()
                .verify_password(password.0.as_bytes(), &hash)
                .is_ok()
        })
    }
}

/// Error of hashing a [`Password`].
#[derive(Clone, Copy, Debug, Display, derive_more::Error)]
#[display("failed to hash password: {_0}")]
pub struct HashError(#[error(not(source))] password_hash::Error);

define_kind! {
    #[doc = "Kind of an [`Account`]."]
    enum Kind {
        #[doc = "Owner of the system, passing every permission check."]
        SuperAdmin = 1,

        #[doc = "Clinic administrator."]
        Admin = 2,

        #[doc = "Clinic secretary."]
        Secretary = 3,

        #[doc = "Patient of the clinic."]
        Patient = 4,
    }
}

impl Kind {
    /// Returns the preset [`Permissions`] granted to a new [`Account`] of
    /// this [`Kind`].
    #[must_use]
    pub const fn default_permissions(self) -> Permissions {
        match self {
            Self::SuperAdmin => Permissions::ALL,
            Self::Admin => Permissions::ADMIN,
            Self::Secretary => Permissions::SECRETARY,
            Self::Patient => Permissions::PATIENT,
        }
    }
}

/// [`DateTime`] when an [`Account`] was created.
pub type CreationDateTime = DateTimeOf<(Account, unit::Creation)>;

/// [`DateTime`] when an [`Account`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Account, unit::Modification)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use super::{
        Account, DisplayName, Id, Kind, Password, PasswordHash, Permissions,
        Username,
    };

    fn account(kind: Kind, permissions: Permissions) -> Account {
        Account {
            id: Id::new(),
            display_name: DisplayName::new("Test").unwrap(),
            username: Username::new("test").unwrap(),
            password_hash: PasswordHash::new(&Password::from("secret"))
                .unwrap(),
            kind,
            permissions,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn super_admin_passes_every_check() {
        for stored in [Permissions::NONE, Permissions::PATIENT, Permissions::ALL]
        {
            let acc = account(Kind::SuperAdmin, stored);
            for bit in Permissions::ALL.iter() {
                assert!(acc.has_permission(bit), "{bit:?} with {stored:?}");
            }
        }
    }

    #[test]
    fn others_are_checked_against_bitmask() {
        for kind in [Kind::Admin, Kind::Secretary, Kind::Patient] {
            for stored in [
                Permissions::NONE,
                Permissions::PATIENT,
                Permissions::SECRETARY,
                Permissions::ADMIN,
            ] {
                let acc = account(kind, stored);
                for bit in Permissions::ALL.iter() {
                    assert_eq!(
                        acc.has_permission(bit),
                        stored.bits() & bit.bits() != 0,
                        "{kind} with {stored:?} checking {bit:?}",
                    );
                }
            }
        }
    }

    #[test]
    fn password_hash_verifies_only_its_password() {
        let hash = PasswordHash::new(&Password::from("correct")).unwrap();

        assert!(hash.verify(&Password::from("correct")));
        assert!(!hash.verify(&Password::from("wrong")));
        assert_ne!(
            hash,
            PasswordHash::new(&Password::from("correct")).unwrap(),
            "salt must differ between hashes",
        );
    }

    #[test]
    fn username_format() {
        assert!(Username::new("sec1").is_some());
        assert!(Username::new("dr.house-2").is_some());
        assert!(Username::new("").is_none());
        assert!(Username::new("with space").is_none());
        assert!(Username::new("x".repeat(65)).is_none());
    }
}
