//! [`Command`] for registering a new [`Medicine`] batch.

use common::{operations::Insert, DateTime};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{account::Permissions, medicine, Account, Medicine},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for registering a new [`Medicine`] batch in the stock.
#[derive(Clone, Debug)]
pub struct CreateMedicine {
    /// [`Account`] performing this [`Command`].
    pub by: Account,

    /// Name of the new [`Medicine`].
    pub name: medicine::Name,

    /// Dose of a single package of the new [`Medicine`].
    pub dose: medicine::Dose,

    /// Unit the dose is measured in.
    pub unit: medicine::Unit,

    /// Number of received packages.
    pub amount: medicine::Amount,

    /// [`DateTime`] when the new [`Medicine`] expires.
    pub expires_at: medicine::ExpirationDateTime,

    /// [`DateTime`] when the new [`Medicine`] was received.
    pub received_at: medicine::ReceptionDateTime,

    /// Manufacturer of the new [`Medicine`].
    pub manufacturer: medicine::Manufacturer,

    /// Batch number of the new [`Medicine`].
    pub batch_number: medicine::BatchNumber,

    /// Coagulation factor type of the new [`Medicine`].
    pub factor_type: medicine::FactorType,
}

impl<Db, C> Command<CreateMedicine> for Service<Db, C>
where
    Db: Database<Insert<Medicine>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Medicine;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateMedicine,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateMedicine {
            by,
            name,
            dose,
            unit,
            amount,
            expires_at,
            received_at,
            manufacturer,
            batch_number,
            factor_type,
        } = cmd;

        if !by.has_permission(Permissions::WRITE_MEDICINE) {
            return Err(tracerr::new!(E::PermissionDenied));
        }

        let medicine = Medicine {
            id: medicine::Id::new(),
            name,
            dose,
            unit,
            amount,
            expires_at,
            received_at,
            manufacturer,
            batch_number,
            factor_type,
            created_at: DateTime::now().coerce(),
        };
        self.database()
            .execute(Insert(medicine.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(
            "`Account(id: {})` registered {amount} packages of \
             `Medicine(id: {})`",
            by.id,
            medicine.id,
        );

        Ok(medicine)
    }
}

/// Error of [`CreateMedicine`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Account`] performing the [`Command`] lacks permissions.
    #[display("Permission denied")]
    #[from(ignore)]
    PermissionDenied,
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;

    use crate::{
        domain::{account::Kind, medicine, Account},
        fixture, Command as _,
    };

    use super::{CreateMedicine, ExecutionError};

    fn create(by: Account) -> CreateMedicine {
        CreateMedicine {
            by,
            name: medicine::Name::new("Octanate").unwrap(),
            dose: medicine::Dose::new(500).unwrap(),
            unit: medicine::Unit::new("IU").unwrap(),
            amount: medicine::Amount::new(12).unwrap(),
            expires_at: (DateTime::now() + Duration::from_secs(3600)).coerce(),
            received_at: DateTime::now().coerce(),
            manufacturer: medicine::Manufacturer::new("Octapharma").unwrap(),
            batch_number: medicine::BatchNumber::new("A123").unwrap(),
            factor_type: medicine::FactorType::new("VIII").unwrap(),
        }
    }

    #[tokio::test]
    async fn stores_medicine() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;

        let med = svc.execute(create(sec)).await.unwrap();

        assert_eq!(fixture::amount_of(&svc, med.id).await.get(), 12);
    }

    #[tokio::test]
    async fn requires_write_medicine_permission() {
        let svc = fixture::service();
        let patient =
            fixture::account(&svc, Kind::Patient, "patient", "pass").await;

        let err = svc.execute(create(patient)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PermissionDenied));
    }
}
