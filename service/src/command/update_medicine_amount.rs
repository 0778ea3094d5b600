//! [`Command`] for setting the stock [`medicine::Amount`] of a [`Medicine`].

use common::operations::{By, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{account::Permissions, medicine, Account, Medicine},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for administratively setting the number of packages of a
/// [`Medicine`] left in the stock.
#[derive(Clone, Debug)]
pub struct UpdateMedicineAmount {
    /// [`Account`] performing this [`Command`].
    pub by: Account,

    /// ID of the [`Medicine`] to update.
    pub medicine_id: medicine::Id,

    /// New [`medicine::Amount`] of the [`Medicine`].
    pub amount: medicine::Amount,
}

impl<Db, C> Command<UpdateMedicineAmount> for Service<Db, C>
where
    Db: Database<
        Update<By<Medicine, (medicine::Id, medicine::Amount)>>,
        Ok = Option<Medicine>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Medicine;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateMedicineAmount,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateMedicineAmount {
            by,
            medicine_id,
            amount,
        } = cmd;

        if !by.has_permission(Permissions::WRITE_MEDICINE) {
            return Err(tracerr::new!(E::PermissionDenied));
        }

        let medicine = self
            .database()
            .execute(Update(By::new((medicine_id, amount))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::MedicineNotExists(medicine_id)))?;

        log::info!(
            "`Account(id: {})` set amount of `Medicine(id: {medicine_id})` \
             to {amount}",
            by.id,
        );

        Ok(medicine)
    }
}

/// Error of [`UpdateMedicineAmount`] [`Command`] execution.
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

#[cfg(test)]
mod spec {
    use crate::{
        domain::{account::Kind, medicine},
        fixture, Command as _,
    };

    use super::{ExecutionError, UpdateMedicineAmount};

    #[tokio::test]
    async fn sets_amount() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;
        let med = fixture::medicine(&svc, "Octanate", 5).await;

        let updated = svc
            .execute(UpdateMedicineAmount {
                by: sec,
                medicine_id: med.id,
                amount: medicine::Amount::new(40).unwrap(),
            })
            .await
            .unwrap();

        assert_eq!(updated.amount.get(), 40);
        assert_eq!(fixture::amount_of(&svc, med.id).await.get(), 40);
    }

    #[tokio::test]
    async fn fails_on_missing_medicine() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;

        let err = svc
            .execute(UpdateMedicineAmount {
                by: sec,
                medicine_id: medicine::Id::new(),
                amount: medicine::Amount::ZERO,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::MedicineNotExists(_)));
    }
}
