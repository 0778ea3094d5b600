//! [`Database`]-related implementations.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

pub mod constraint {
    //! Names of uniqueness constraints reported by [`Error`]s.
    //!
    //! [`Error`]: super::Error

    /// Uniqueness of [`Account`] usernames.
    ///
    /// [`Account`]: crate::domain::Account
    pub const ACCOUNTS_USERNAME_KEY: &str = "accounts_username_key";

    /// Uniqueness of [`Patient`] public IDs.
    ///
    /// [`Patient`]: crate::domain::Patient
    pub const PATIENTS_PUBLIC_ID_KEY: &str = "patients_public_id_key";
}

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [`Memory`] error.
    Memory(memory::Error),

    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),
}

impl Error {
    /// Checks whether this [`Error`] is a violation of a uniqueness
    /// constraint, optionally the specified one.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::Memory(e) => e.is_unique_violation(constraint),
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_unique_violation(constraint),
        }
    }
}
