//! [`Command`] for creating a [`Visit`] dispensing [`Medicine`]s.

use std::collections::{BTreeMap, HashMap};

use common::{
    operations::{
        By, Commit, Decrement, Insert, Lock, Select, Transact, Transacted,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use itertools::Itertools as _;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        account::Permissions, medicine, patient, prescription, visit, Account,
        Medicine, Patient, Prescription, Visit,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Visit`] of a [`Patient`].
///
/// Every dispensed [`Medicine`] package gets its own [`Prescription`], and
/// the stock is decremented accordingly. Either everything is stored, or
/// nothing is.
#[derive(Clone, Debug)]
pub struct CreateVisit {
    /// [`Account`] performing this [`Command`].
    pub by: Account,

    /// Public ID of the visiting [`Patient`].
    pub patient: patient::PublicId,

    /// Reason of the new [`Visit`].
    pub reason: visit::Reason,

    /// Free-form notes of the new [`Visit`].
    pub notes: String,

    /// Measured weight of the [`Patient`].
    pub patient_weight: Option<visit::Weight>,

    /// Measured height of the [`Patient`].
    pub patient_height: Option<visit::Height>,

    /// Requested numbers of packages per [`Medicine`].
    ///
    /// Repeated [`Medicine`]s have their amounts summed up.
    pub medicines: Vec<(medicine::Id, medicine::Amount)>,
}

/// Output of [`CreateVisit`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Created [`Visit`].
    pub visit: Visit,

    /// [`Prescription`]s of every dispensed package.
    pub prescriptions: Vec<Prescription>,
}

impl<Db, C> Command<CreateVisit> for Service<Db, C>
where
    Db: for<'l> Database<
            Select<By<Option<Patient>, &'l patient::PublicId>>,
            Ok = Option<Patient>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Medicine, Vec<medicine::Id>>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HashMap<medicine::Id, Medicine>, Vec<medicine::Id>>>,
            Ok = HashMap<medicine::Id, Medicine>,
            Err = Traced<database::Error>,
        > + Database<Insert<Visit>, Ok = (), Err = Traced<database::Error>>
        + Database<
            Insert<Vec<Prescription>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Decrement<
                By<Option<medicine::Amount>, (medicine::Id, medicine::Amount)>,
            >,
            Ok = Option<medicine::Amount>,
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateVisit) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateVisit {
            by,
            patient,
            reason,
            notes,
            patient_weight,
            patient_height,
            medicines,
        } = cmd;

        if !by.has_permission(Permissions::WRITE_OTHER_VISITS) {
            return Err(tracerr::new!(E::PermissionDenied));
        }

        let patient = self
            .database()
            .execute(Select(By::new(&patient)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::PatientNotExists(patient)))?;

        let mut requested = BTreeMap::<medicine::Id, medicine::Amount>::new();
        for (id, amount) in medicines {
            let total = requested.entry(id).or_default();
            *total = total
                .checked_add(amount)
                .ok_or_else(|| tracerr::new!(E::AmountOverflow(id)))?;
        }
        requested.retain(|_, amount| *amount > medicine::Amount::ZERO);
        let ids = requested.keys().copied().collect_vec();

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent allocations of the same `Medicine`s.
        tx.execute(Lock(By::new(ids.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let stock = tx
            .execute(Select(By::new(ids)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut allocations = Vec::with_capacity(requested.len());
        for (id, amount) in requested {
            let medicine = stock
                .get(&id)
                .ok_or_else(|| tracerr::new!(E::MedicineNotExists(id)))?;
            if amount > medicine.amount {
                log::warn!(
                    "insufficient `Medicine(id: {id})`: requested {amount}, \
                     left {}",
                    medicine.amount,
                );
                return Err(tracerr::new!(E::InsufficientMedicine {
                    name: medicine.name.clone(),
                    exceeding: amount,
                    left: medicine.amount,
                }));
            }
            allocations.push((medicine, amount));
        }

        let now = DateTime::now();
        let visit = Visit {
            id: visit::Id::new(),
            patient_id: patient.id,
            reason,
            notes,
            patient_weight,
            patient_height,
            created_at: now.coerce(),
        };
        tx.execute(Insert(visit.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let prescriptions = allocations
            .iter()
            .flat_map(|(m, amount)| itertools::repeat_n(m.id, amount.count()))
            .map(|medicine_id| Prescription {
                id: prescription::Id::new(),
                visit_id: visit.id,
                patient_id: patient.id,
                medicine_id,
                used_at: None,
                created_at: now.coerce(),
            })
            .collect_vec();
        tx.execute(Insert(prescriptions.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        for &(medicine, amount) in &allocations {
            let left = tx
                .execute(Decrement(By::new((medicine.id, amount))))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if left.is_none() {
                return Err(tracerr::new!(E::InsufficientMedicine {
                    name: medicine.name.clone(),
                    exceeding: amount,
                    left: medicine.amount,
                }));
            }
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(
            "`Account(id: {})` created `Visit(id: {})` dispensing {} packages",
            by.id,
            visit.id,
            prescriptions.len(),
        );

        Ok(Output {
            visit,
            prescriptions,
        })
    }
}

/// Error of [`CreateVisit`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Account`] performing the [`Command`] lacks permissions.
    #[display("Permission denied")]
    #[from(ignore)]
    PermissionDenied,

    /// [`Patient`] doesn't exist.
    #[display("`Patient(public_id: {_0})` does not exist")]
    #[from(ignore)]
    PatientNotExists(#[error(not(source))] patient::PublicId),

    /// Requested [`Medicine`] doesn't exist.
    #[display("`Medicine(id: {_0})` does not exist")]
    #[from(ignore)]
    MedicineNotExists(#[error(not(source))] medicine::Id),

    /// Requested packages of a [`Medicine`] don't fit into [`i32`].
    #[display("Too many packages of `Medicine(id: {_0})` requested")]
    #[from(ignore)]
    AmountOverflow(#[error(not(source))] medicine::Id),

    /// Not enough packages of a [`Medicine`] left in the stock.
    #[display(
        "Not enough `{name}` medicine: requested {exceeding}, left {left}"
    )]
    #[from(ignore)]
    InsufficientMedicine {
        /// Name of the [`Medicine`].
        name: medicine::Name,

        /// Requested number of packages.
        exceeding: medicine::Amount,

        /// Number of packages left in the stock.
        left: medicine::Amount,
    },
}

#[cfg(test)]
mod spec {
    use std::{collections::HashMap, time::Duration};

    use common::operations::{
        By, Commit, Decrement, Insert, Lock, Select, Transact,
    };
    use tracerr::Traced;

    use crate::{
        domain::{
            account::Kind, medicine, patient, visit, Account, Medicine,
            Patient, Prescription, Visit,
        },
        fixture::{self, TestService},
        infra::{
            cache,
            database::{self, memory::Tx},
            Database,
        },
        Command as _, Config, Service,
    };

    use super::{CreateVisit, ExecutionError};

    /// [`Database`] reporting more packages in stock than there are.
    #[derive(Clone, Debug)]
    struct Inflated<Db>(Db);

    impl<'l> Database<Select<By<Option<Patient>, &'l patient::PublicId>>>
        for Inflated<database::Memory>
    {
        type Ok = Option<Patient>;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            op: Select<By<Option<Patient>, &'l patient::PublicId>>,
        ) -> Result<Self::Ok, Self::Err> {
            self.0.execute(op).await
        }
    }

    impl Database<Transact> for Inflated<database::Memory> {
        type Ok = Inflated<database::Memory<Tx>>;
        type Err = Traced<database::Error>;

        async fn execute(&self, op: Transact) -> Result<Self::Ok, Self::Err> {
            self.0.execute(op).await.map(Inflated)
        }
    }

    impl
        Database<
            Select<By<HashMap<medicine::Id, Medicine>, Vec<medicine::Id>>>,
        > for Inflated<database::Memory<Tx>>
    {
        type Ok = HashMap<medicine::Id, Medicine>;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            op: Select<By<HashMap<medicine::Id, Medicine>, Vec<medicine::Id>>>,
        ) -> Result<Self::Ok, Self::Err> {
            let mut stock = self.0.execute(op).await?;
            for m in stock.values_mut() {
                m.amount = m.amount.checked_add(amount(10)).unwrap();
            }
            Ok(stock)
        }
    }

    macro_rules! delegate {
        ($($op:ty),+ $(,)?) => {$(
            impl Database<$op> for Inflated<database::Memory<Tx>> {
                type Ok = <database::Memory<Tx> as Database<$op>>::Ok;
                type Err = Traced<database::Error>;

                async fn execute(
                    &self,
                    op: $op,
                ) -> Result<Self::Ok, Self::Err> {
                    self.0.execute(op).await
                }
            }
        )+};
    }

    delegate!(
        Lock<By<Medicine, Vec<medicine::Id>>>,
        Insert<Visit>,
        Insert<Vec<Prescription>>,
        Decrement<
            By<Option<medicine::Amount>, (medicine::Id, medicine::Amount)>,
        >,
        Commit,
    );

    fn config() -> Config {
        Config::from_secret(b"test-secret", Duration::from_secs(60))
    }

    fn visit(
        by: Account,
        medicines: Vec<(medicine::Id, medicine::Amount)>,
    ) -> CreateVisit {
        CreateVisit {
            by,
            patient: patient::PublicId::new("P-1").unwrap(),
            reason: visit::Reason::HomeTreatment,
            notes: String::new(),
            patient_weight: None,
            patient_height: None,
            medicines,
        }
    }

    fn amount(n: i32) -> medicine::Amount {
        medicine::Amount::new(n).unwrap()
    }

    async fn visits_of(svc: &TestService, id: patient::Id) -> Vec<Visit> {
        svc.database()
            .execute(Select(By::<Vec<Visit>, _>::new(id)))
            .await
            .unwrap()
    }

    async fn prescriptions_of(
        svc: &TestService,
        id: visit::Id,
    ) -> Vec<Prescription> {
        svc.database()
            .execute(Select(By::<Vec<Prescription>, _>::new(id)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn dispenses_whole_stock() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;
        let p = fixture::patient(&svc, "P-1").await;
        let med = fixture::medicine(&svc, "Octanate", 5).await;

        let out = svc
            .execute(visit(sec, vec![(med.id, amount(5))]))
            .await
            .unwrap();

        assert_eq!(fixture::amount_of(&svc, med.id).await, amount(0));
        assert_eq!(out.prescriptions.len(), 5);
        let stored = prescriptions_of(&svc, out.visit.id).await;
        assert_eq!(stored.len(), 5);
        assert!(stored.iter().all(|row| row.medicine_id == med.id));
        assert!(stored.iter().all(|row| row.patient_id == p.id));
        assert!(stored.iter().all(|row| row.used_at.is_none()));
    }

    #[tokio::test]
    async fn rejects_exceeding_request_without_changes() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;
        let p = fixture::patient(&svc, "P-1").await;
        let med = fixture::medicine(&svc, "Octanate", 5).await;
        let other = fixture::medicine(&svc, "Hemlibra", 10).await;

        let err = svc
            .execute(visit(
                sec,
                vec![(other.id, amount(2)), (med.id, amount(6))],
            ))
            .await
            .unwrap_err();

        match err.as_ref() {
            ExecutionError::InsufficientMedicine {
                name,
                exceeding,
                left,
            } => {
                assert_eq!(name, &med.name);
                assert_eq!(*exceeding, amount(6));
                assert_eq!(*left, amount(5));
            }
            e => panic!("unexpected error: {e}"),
        }
        assert_eq!(fixture::amount_of(&svc, med.id).await, amount(5));
        assert_eq!(fixture::amount_of(&svc, other.id).await, amount(10));
        assert!(visits_of(&svc, p.id).await.is_empty());
    }

    #[tokio::test]
    async fn rolls_back_when_decrement_finds_no_stock() {
        let db = database::Memory::new();
        let plain: TestService =
            Service::new(config(), db.clone(), cache::Memory::new());
        let svc = Service::new(config(), Inflated(db), cache::Memory::new());
        let sec =
            fixture::account(&plain, Kind::Secretary, "sec1", "pass").await;
        let p = fixture::patient(&plain, "P-1").await;
        let med = fixture::medicine(&plain, "Octanate", 2).await;
        let other = fixture::medicine(&plain, "Hemlibra", 10).await;

        let err = svc
            .execute(visit(
                sec,
                vec![(other.id, amount(4)), (med.id, amount(3))],
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::InsufficientMedicine { name, exceeding, .. }
                if *name == med.name && *exceeding == amount(3),
        ));
        assert_eq!(fixture::amount_of(&plain, med.id).await, amount(2));
        assert_eq!(fixture::amount_of(&plain, other.id).await, amount(10));
        assert!(visits_of(&plain, p.id).await.is_empty());
    }

    #[tokio::test]
    async fn sums_repeated_medicines() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;
        _ = fixture::patient(&svc, "P-1").await;
        let med = fixture::medicine(&svc, "Octanate", 5).await;

        let err = svc
            .execute(visit(
                sec.clone(),
                vec![(med.id, amount(3)), (med.id, amount(3))],
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InsufficientMedicine { exceeding, .. }
                if *exceeding == amount(6),
        ));

        let out = svc
            .execute(visit(sec, vec![(med.id, amount(2)), (med.id, amount(1))]))
            .await
            .unwrap();
        assert_eq!(out.prescriptions.len(), 3);
        assert_eq!(fixture::amount_of(&svc, med.id).await, amount(2));
    }

    #[tokio::test]
    async fn never_overallocates_concurrently() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;
        _ = fixture::patient(&svc, "P-1").await;
        let med = fixture::medicine(&svc, "Octanate", 5).await;

        let (first, second) = tokio::join!(
            svc.execute(visit(sec.clone(), vec![(med.id, amount(3))])),
            svc.execute(visit(sec, vec![(med.id, amount(3))])),
        );

        let succeeded = [first.is_ok(), second.is_ok()]
            .into_iter()
            .filter(|ok| *ok)
            .count();
        assert_eq!(succeeded, 1);
        for res in [first, second] {
            if let Err(e) = res {
                assert!(matches!(
                    e.as_ref(),
                    ExecutionError::InsufficientMedicine { left, .. }
                        if *left == amount(2),
                ));
            }
        }
        assert_eq!(fixture::amount_of(&svc, med.id).await, amount(2));
    }

    #[tokio::test]
    async fn fails_on_unknown_references() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;

        let err = svc
            .execute(visit(sec.clone(), vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::PatientNotExists(_)));

        _ = fixture::patient(&svc, "P-1").await;
        let err = svc
            .execute(visit(sec, vec![(medicine::Id::new(), amount(1))]))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::MedicineNotExists(_)));
    }

    #[tokio::test]
    async fn requires_write_other_visits_permission() {
        let svc = fixture::service();
        let patient =
            fixture::account(&svc, Kind::Patient, "patient", "pass").await;
        _ = fixture::patient(&svc, "P-1").await;
        let med = fixture::medicine(&svc, "Octanate", 5).await;

        let err = svc
            .execute(visit(patient, vec![(med.id, amount(1))]))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PermissionDenied));
        assert_eq!(fixture::amount_of(&svc, med.id).await, amount(5));
    }
}
