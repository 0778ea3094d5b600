//! In-process [`Database`] implementation.
//!
//! Transactions are serializable: a [`Tx`] holds the whole [`State`]
//! exclusively until it's committed or dropped, so any non-transactional
//! access made while it's alive waits for it.

mod impls;

use std::{collections::HashMap, future::Future, sync::Arc};

use derive_more::{Deref, Display, Error as StdError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracerr::Traced;

use crate::{
    domain::{
        account, medicine, patient, Account, Medicine, Patient, Prescription,
        Visit,
    },
    infra::database,
};
#[cfg(doc)]
use crate::infra::Database;

/// In-process [`Database`].
#[derive(Clone, Debug, Default, Deref)]
pub struct Memory<T = NonTx>(T);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Stored data of a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct State {
    /// Stored [`Account`]s.
    accounts: HashMap<account::Id, Account>,

    /// Stored [`Medicine`]s.
    medicines: HashMap<medicine::Id, Medicine>,

    /// Stored [`Patient`]s.
    patients: HashMap<patient::Id, Patient>,

    /// Stored [`Visit`]s in order of insertion.
    visits: Vec<Visit>,

    /// Stored [`Prescription`]s in order of insertion.
    prescriptions: Vec<Prescription>,
}

/// Access to the [`State`] of a [`Memory`] database.
pub trait Access {
    /// Applies the provided function to the accessible [`State`].
    ///
    /// # Errors
    ///
    /// If the [`State`] is not accessible anymore.
    fn with<R>(
        &self,
        f: impl FnOnce(&mut State) -> R,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>;
}

/// Non-transactional access applying every change immediately.
#[derive(Clone, Debug, Default)]
pub struct NonTx {
    /// Committed [`State`].
    state: Arc<Mutex<State>>,
}

impl Access for NonTx {
    async fn with<R>(
        &self,
        f: impl FnOnce(&mut State) -> R,
    ) -> Result<R, Traced<database::Error>> {
        Ok(f(&mut *self.state.lock().await))
    }
}

/// Transactional access staging changes until they're committed.
#[derive(Clone, Debug)]
pub struct Tx {
    /// Staged changes, [`None`] once committed.
    staged: Arc<Mutex<Option<Staged>>>,
}

/// Changes staged by a [`Tx`].
#[derive(Debug)]
struct Staged {
    /// Exclusively held committed [`State`].
    committed: OwnedMutexGuard<State>,

    /// [`State`] with the changes applied.
    state: State,
}

impl Tx {
    /// Starts a new [`Tx`] over the provided committed [`State`], waiting
    /// for any other [`Tx`] to finish.
    async fn begin(state: Arc<Mutex<State>>) -> Self {
        let committed = state.lock_owned().await;
        let state = State::clone(&committed);
        Self {
            staged: Arc::new(Mutex::new(Some(Staged { committed, state }))),
        }
    }

    /// Commits the changes of this [`Tx`].
    ///
    /// # Errors
    ///
    /// If this [`Tx`] is already committed.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let staged = self.staged.lock().await.take().ok_or_else(|| {
            tracerr::new!(database::Error::from(Error::Committed))
        })?;
        let Staged {
            mut committed,
            state,
        } = staged;
        *committed = state;
        Ok(())
    }
}

impl Access for Tx {
    async fn with<R>(
        &self,
        f: impl FnOnce(&mut State) -> R,
    ) -> Result<R, Traced<database::Error>> {
        let mut staged = self.staged.lock().await;
        let staged = staged.as_mut().ok_or_else(|| {
            tracerr::new!(database::Error::from(Error::Committed))
        })?;
        Ok(f(&mut staged.state))
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// [`Tx`] is used after being committed.
    #[display("transaction is already committed")]
    Committed,

    /// Uniqueness constraint is violated.
    #[display("unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks whether this [`Error`] is a violation of a uniqueness
    /// constraint, optionally the specified one.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation(c) => constraint.map_or(true, |n| n == *c),
            Self::Committed => false,
        }
    }
}
