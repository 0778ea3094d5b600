//! [`Query`] definition.

pub mod account;
pub mod accounts;
pub mod medicine;
pub mod medicines;
pub mod visit;
pub mod visits;

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{account::Permissions, patient, Account},
    infra::{database, Database},
    Service,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

/// [`Query`] [`Select`]ing a `T`ype from a [`Database`].
#[derive(Clone, Copy, Debug)]
#[expect(clippy::module_name_repetitions, reason = "more readable")]
pub struct DatabaseQuery<T>(T);

impl<W, B> DatabaseQuery<By<W, B>> {
    /// Creates a new [`DatabaseQuery`] selecting a `W` by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(By::new(by))
    }
}

/// [`Query`] requiring some [`Permissions`] to be executed.
pub trait Restricted {
    /// [`Permissions`] any of which allows to execute this [`Query`].
    const REQUIRED: Permissions;
}

/// [`Restricted`] [`Query`] executed on behalf of an [`Account`].
#[derive(Clone, Debug)]
pub struct Authorized<Q> {
    /// [`Account`] executing the [`Query`].
    pub by: Account,

    /// [`Query`] to execute.
    pub query: Q,
}

impl<Q: Restricted> Authorized<Q> {
    /// Wraps the provided `query` to be executed by the provided [`Account`].
    #[must_use]
    pub const fn new(by: Account, query: Q) -> Self {
        Self { by, query }
    }

    /// Checks whether the executing [`Account`] may run the [`Query`].
    ///
    /// # Errors
    ///
    /// With [`ExecutionError::PermissionDenied`] if it may not.
    pub fn check(&self) -> Result<(), Traced<ExecutionError>> {
        if self.by.has_permission(Q::REQUIRED) {
            Ok(())
        } else {
            Err(tracerr::new!(ExecutionError::PermissionDenied))
        }
    }
}

impl<Db, C, W, B> Query<Authorized<DatabaseQuery<By<W, B>>>>
    for Service<Db, C>
where
    DatabaseQuery<By<W, B>>: Restricted,
    Db: Database<Select<By<W, B>>, Ok = W, Err = Traced<database::Error>>,
{
    type Ok = W;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: Authorized<DatabaseQuery<By<W, B>>>,
    ) -> Result<Self::Ok, Self::Err> {
        query.check().map_err(tracerr::wrap!())?;

        let DatabaseQuery(by) = query.query;
        self.database()
            .execute(Select(by))
            .await
            .map_err(tracerr::map_from_and_wrap!())
    }
}

/// Error of an [`Authorized`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Account`] executing the [`Query`] lacks permissions.
    #[display("Permission denied")]
    #[from(ignore)]
    PermissionDenied,

    /// Requested [`Patient`] doesn't exist.
    ///
    /// [`Patient`]: crate::domain::Patient
    #[display("`Patient(public_id: {_0})` does not exist")]
    #[from(ignore)]
    PatientNotExists(#[error(not(source))] patient::PublicId),

    /// [`Account`] executing the [`Query`] has no [`Patient`] record.
    ///
    /// [`Patient`]: crate::domain::Patient
    #[display("`Account` is not registered as a `Patient`")]
    #[from(ignore)]
    NotPatient,
}
