//! [`Command`] for registering a new [`Patient`].

use common::{
    operations::{Commit, Insert, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        account::{self, Permissions},
        patient, Account, Patient,
    },
    infra::{
        database::{
            self,
            constraint::{ACCOUNTS_USERNAME_KEY, PATIENTS_PUBLIC_ID_KEY},
        },
        Database,
    },
    Service,
};

use super::Command;

/// [`Command`] for registering a new [`Patient`] along with the [`Account`]
/// they log in with.
///
/// The [`Account`] has the [`patient::PublicId`] as its username and the
/// [`Permissions::PATIENT`] preset.
#[derive(Clone, Debug)]
pub struct CreatePatient {
    /// [`Account`] performing this [`Command`].
    pub by: Account,

    /// [`patient::PublicId`] of the new [`Patient`].
    pub public_id: patient::PublicId,

    /// [`patient::Name`] of the new [`Patient`].
    pub name: patient::Name,

    /// [`account::Password`] of the new [`Patient`]'s [`Account`].
    pub password: SecretBox<account::Password>,
}

/// Output of [`CreatePatient`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Registered [`Patient`].
    pub patient: Patient,

    /// [`Account`] of the registered [`Patient`].
    pub account: Account,
}

impl<Db, C> Command<CreatePatient> for Service<Db, C>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Insert<Patient>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Insert<Account>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreatePatient) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreatePatient {
            by,
            public_id,
            name,
            password,
        } = cmd;

        if !by.has_permission(Permissions::WRITE_PATIENT) {
            return Err(tracerr::new!(E::PermissionDenied));
        }

        let Some(username) = account::Username::new(public_id.to_string())
        else {
            return Err(tracerr::new!(E::InvalidUsername(public_id)));
        };
        let Some(display_name) = account::DisplayName::new(name.to_string())
        else {
            return Err(tracerr::new!(E::InvalidDisplayName(name)));
        };
        let password_hash = account::PasswordHash::new(password.expose_secret())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let now = DateTime::now();
        let patient = Patient {
            id: patient::Id::new(),
            public_id,
            name,
            created_at: now.coerce(),
        };
        let account = Account {
            id: account::Id::new(),
            display_name,
            username,
            password_hash,
            kind: account::Kind::Patient,
            permissions: Permissions::PATIENT,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        if let Err(e) = tx.execute(Insert(patient.clone())).await {
            return Err(
                if e.as_ref().is_unique_violation(Some(PATIENTS_PUBLIC_ID_KEY))
                {
                    tracerr::new!(E::PatientExists(patient.public_id))
                } else {
                    tracerr::map_from(e)
                },
            );
        }
        if let Err(e) = tx.execute(Insert(account.clone())).await {
            return Err(
                if e.as_ref().is_unique_violation(Some(ACCOUNTS_USERNAME_KEY)) {
                    tracerr::new!(E::UsernameOccupied(account.username))
                } else {
                    tracerr::map_from(e)
                },
            );
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(
            "`Account(id: {})` registered `Patient(id: {})` with \
             `Account(id: {})`",
            by.id,
            patient.id,
            account.id,
        );

        Ok(Output { patient, account })
    }
}

/// Error of [`CreatePatient`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`account::Password`] cannot be hashed.
    #[display("Failed to hash password: {_0}")]
    Hash(account::HashError),

    /// [`Account`] performing the [`Command`] lacks permissions.
    #[display("Permission denied")]
    #[from(ignore)]
    PermissionDenied,

    /// [`patient::PublicId`] cannot be used as an [`account::Username`].
    #[display("`{_0}` is not a valid username")]
    #[from(ignore)]
    InvalidUsername(#[error(not(source))] patient::PublicId),

    /// [`patient::Name`] cannot be used as an [`account::DisplayName`].
    #[display("`{_0}` is not a valid display name")]
    #[from(ignore)]
    InvalidDisplayName(#[error(not(source))] patient::Name),

    /// [`Patient`] with the same [`patient::PublicId`] already exists.
    #[display("`Patient(public_id: {_0})` already exists")]
    #[from(ignore)]
    PatientExists(#[error(not(source))] patient::PublicId),

    /// [`account::Username`] is already occupied.
    #[display("`{_0}` username is occupied")]
    #[from(ignore)]
    UsernameOccupied(#[error(not(source))] account::Username),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};
    use secrecy::SecretBox;

    use crate::{
        domain::{
            account::{Kind, Password, Permissions, Username},
            patient, Account, Patient,
        },
        fixture,
        infra::Database as _,
        Command as _,
    };

    use super::{CreatePatient, ExecutionError};

    fn register(by: Account, public_id: &str) -> CreatePatient {
        CreatePatient {
            by,
            public_id: patient::PublicId::new(public_id).unwrap(),
            name: patient::Name::new("Jane Roe").unwrap(),
            password: SecretBox::new(Box::new(Password::from("1990"))),
        }
    }

    #[tokio::test]
    async fn registers_patient_with_account() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;

        let out = svc.execute(register(sec, "000042")).await.unwrap();

        assert_eq!(out.patient.public_id.to_string(), "000042");
        assert_eq!(out.account.username.to_string(), "000042");
        assert_eq!(out.account.display_name.to_string(), "Jane Roe");
        assert_eq!(out.account.kind, Kind::Patient);
        assert_eq!(out.account.permissions, Permissions::PATIENT);
        assert!(out.account.password_hash.verify(&Password::from("1990")));

        let stored = svc
            .database()
            .execute(Select(By::<Option<Patient>, _>::new(
                &out.patient.public_id,
            )))
            .await
            .unwrap();
        assert_eq!(stored, Some(out.patient));
        let username = Username::new("000042").unwrap();
        let stored = svc
            .database()
            .execute(Select(By::<Option<Account>, _>::new(&username)))
            .await
            .unwrap();
        assert_eq!(stored, Some(out.account));
    }

    #[tokio::test]
    async fn rejects_existing_public_id() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;
        _ = fixture::patient(&svc, "000042").await;

        let err = svc.execute(register(sec, "000042")).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PatientExists(_)));
        let username = Username::new("000042").unwrap();
        let account = svc
            .database()
            .execute(Select(By::<Option<Account>, _>::new(&username)))
            .await
            .unwrap();
        assert_eq!(account, None);
    }

    #[tokio::test]
    async fn keeps_no_patient_when_username_is_occupied() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;
        _ = fixture::account(&svc, Kind::Secretary, "000042", "pass").await;

        let err = svc.execute(register(sec, "000042")).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UsernameOccupied(_)));
        let public_id = patient::PublicId::new("000042").unwrap();
        let patient = svc
            .database()
            .execute(Select(By::<Option<Patient>, _>::new(&public_id)))
            .await
            .unwrap();
        assert_eq!(patient, None);
    }

    #[tokio::test]
    async fn rejects_public_id_unusable_as_username() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;

        let err = svc.execute(register(sec, "P 42")).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvalidUsername(_)));
    }

    #[tokio::test]
    async fn requires_write_patient_permission() {
        let svc = fixture::service();
        let patient =
            fixture::account(&svc, Kind::Patient, "patient", "pass").await;

        let err = svc.execute(register(patient, "000042")).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PermissionDenied));
    }
}
