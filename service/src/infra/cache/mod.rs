//! [`Cache`]-related implementations.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;
pub mod session;

use std::time::Duration;

use derive_more::{AsRef, Display, Error as StdError, From};

#[cfg(doc)]
use common::operations::{Delete, Insert, Select};

pub use self::{memory::Memory, session::Sessions};
#[cfg(feature = "redis")]
pub use self::redis::Redis;

/// Key-value cache operation.
///
/// Every backend handles:
/// - [`Select`] of an `Option<String>` by a [`Key`], a missing or expired
///   entry being [`None`];
/// - [`Insert`] of an [`Entry`], overwriting any existing one;
/// - [`Delete`] of a [`Key`], deleting a missing entry being a no-op.
pub use common::Handler as Cache;

/// Key of a [`Cache`] entry.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str)]
pub struct Key(String);

impl Key {
    /// Creates a new [`Key`] in the provided `namespace`.
    #[must_use]
    pub fn new(namespace: &str, id: impl std::fmt::Display) -> Self {
        Self(format!("clinic:{namespace}:{id}"))
    }
}

/// [`Cache`] entry to be stored.
#[derive(Clone, Debug)]
pub struct Entry {
    /// [`Key`] of this [`Entry`].
    pub key: Key,

    /// Stored value.
    pub value: String,

    /// Time this [`Entry`] lives for.
    pub ttl: Duration,
}

/// [`Cache`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Cached value cannot be (de)serialized.
    #[display("malformed cached value: {_0}")]
    Json(serde_json::Error),

    #[cfg(feature = "redis")]
    /// [`Redis`] error.
    Redis(redis::Error),
}
