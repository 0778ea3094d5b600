//! [`Command`] for marking a dispensed [`Medicine`] package as used.
//!
//! [`Medicine`]: crate::domain::Medicine

use common::{
    operations::{By, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{account::Permissions, prescription, visit, Account, Prescription},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for marking a [`Prescription`] of a [`Visit`] as used.
///
/// Repeated usage moves the usage [`DateTime`] forward.
///
/// [`Visit`]: crate::domain::Visit
#[derive(Clone, Debug)]
pub struct UseVisitMedicine {
    /// [`Account`] performing this [`Command`].
    pub by: Account,

    /// ID of the [`Visit`] the [`Prescription`] belongs to.
    ///
    /// [`Visit`]: crate::domain::Visit
    pub visit_id: visit::Id,

    /// ID of the used [`Prescription`].
    pub prescription_id: prescription::Id,
}

impl<Db, C> Command<UseVisitMedicine> for Service<Db, C>
where
    Db: Database<
        Update<
            By<
                Option<Prescription>,
                (prescription::Id, visit::Id, prescription::UsageDateTime),
            >,
        >,
        Ok = Option<Prescription>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Prescription;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UseVisitMedicine,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UseVisitMedicine {
            by,
            visit_id,
            prescription_id,
        } = cmd;

        if !by.has_permission(Permissions::WRITE_OWN_VISIT) {
            return Err(tracerr::new!(E::PermissionDenied));
        }

        let prescription = self
            .database()
            .execute(Update(By::new((
                prescription_id,
                visit_id,
                DateTime::now().coerce(),
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| {
                tracerr::new!(E::PrescriptionNotExists(prescription_id))
            })?;

        log::debug!(
            "`Account(id: {})` used `Prescription(id: {prescription_id})`",
            by.id,
        );

        Ok(prescription)
    }
}

/// Error of [`UseVisitMedicine`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Account`] performing the [`Command`] lacks permissions.
    #[display("Permission denied")]
    #[from(ignore)]
    PermissionDenied,

    /// [`Prescription`] doesn't exist within the [`Visit`].
    ///
    /// [`Visit`]: crate::domain::Visit
    #[display("`Prescription(id: {_0})` does not exist")]
    #[from(ignore)]
    PrescriptionNotExists(#[error(not(source))] prescription::Id),
}
