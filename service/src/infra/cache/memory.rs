//! In-process [`Cache`] backend.

use std::{sync::Arc, time::Instant};

use common::operations::{By, Delete, Insert, Select};
use dashmap::DashMap;
use tracerr::Traced;

use super::{Cache, Entry, Error, Key};

/// In-process [`Cache`] backend expiring its entries lazily on access.
///
/// Clones share the same storage.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Stored values along with their expiration instants.
    ///
    /// [`None`] means the entry outlives any representable [`Instant`].
    entries: Arc<DashMap<Key, (String, Option<Instant>)>>,
}

impl Memory {
    /// Creates a new empty [`Memory`] backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether there are no stored entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Cache<Select<By<Option<String>, Key>>> for Memory {
    type Ok = Option<String>;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<String>, Key>>,
    ) -> Result<Self::Ok, Self::Err> {
        let key = by.into_inner();
        let now = Instant::now();

        drop(
            self.entries
                .remove_if(&key, |_, (_, exp)| exp.is_some_and(|e| e <= now)),
        );
        Ok(self.entries.get(&key).map(|e| e.0.clone()))
    }
}

impl Cache<Insert<Entry>> for Memory {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Insert(entry): Insert<Entry>,
    ) -> Result<Self::Ok, Self::Err> {
        let Entry { key, value, ttl } = entry;

        let expires_at = Instant::now().checked_add(ttl);
        drop(self.entries.insert(key, (value, expires_at)));
        Ok(())
    }
}

impl Cache<Delete<Key>> for Memory {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Delete(key): Delete<Key>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.entries.remove(&key));
        Ok(())
    }
}
