//! [`Command`] for deleting a [`Medicine`].

use common::operations::{By, Delete};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{account::Permissions, medicine, Account, Medicine},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Medicine`] from the stock.
#[derive(Clone, Debug)]
pub struct DeleteMedicine {
    /// [`Account`] performing this [`Command`].
    pub by: Account,

    /// ID of the [`Medicine`] to delete.
    pub medicine_id: medicine::Id,
}

impl<Db, C> Command<DeleteMedicine> for Service<Db, C>
where
    Db: Database<
        Delete<By<Medicine, medicine::Id>>,
        Ok = Option<Medicine>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Medicine;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteMedicine,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteMedicine { by, medicine_id } = cmd;

        if !by.has_permission(Permissions::WRITE_MEDICINE) {
            return Err(tracerr::new!(E::PermissionDenied));
        }

        let medicine = self
            .database()
            .execute(Delete(By::new(medicine_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::MedicineNotExists(medicine_id)))?;

        log::info!(
            "`Account(id: {})` deleted `Medicine(id: {medicine_id})`",
            by.id,
        );

        Ok(medicine)
    }
}

/// Error of [`DeleteMedicine`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Account`] performing the [`Command`] lacks permissions.
    #[display("Permission denied")]
    #[from(ignore)]
    PermissionDenied,

    /// [`Medicine`] doesn't exist.
    #[display("`Medicine(id: {_0})` does not exist")]
    #[from(ignore)]
    MedicineNotExists(#[error(not(source))] medicine::Id),
}
