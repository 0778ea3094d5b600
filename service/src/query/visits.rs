//! [`Query`] collection related to the multiple [`Visit`]s of a [`Patient`].

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{
        account::Permissions, patient, visit, Patient, Prescription, Visit,
    },
    infra::{database, Database},
    Query, Service,
};

use super::{Authorized, ExecutionError, Restricted};

/// [`Visit`] along with the [`Prescription`]s dispensed during it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Detailed {
    /// [`Visit`] itself.
    pub visit: Visit,

    /// [`Prescription`]s of the [`Visit`] in order of their creation.
    pub prescriptions: Vec<Prescription>,
}

/// Queries all the [`Visit`]s of a [`Patient`] in order of their creation.
#[derive(Clone, Debug)]
pub struct OfPatient(pub patient::PublicId);

impl Restricted for OfPatient {
    const REQUIRED: Permissions = Permissions::READ_OTHER_VISITS;
}

/// Queries the latest [`Visit`] of the [`Patient`] whose [`Account`] executes
/// this [`Query`].
///
/// A [`Patient`] [`Account`] is the one having the [`Patient`]'s public ID as
/// its username.
///
/// [`Account`]: crate::domain::Account
#[derive(Clone, Copy, Debug, Default)]
pub struct LastOwn;

impl Restricted for LastOwn {
    const REQUIRED: Permissions = Permissions::READ_OWN_VISIT;
}

impl<Db, C> Query<Authorized<OfPatient>> for Service<Db, C>
where
    Db: for<'l> Database<
            Select<By<Option<Patient>, &'l patient::PublicId>>,
            Ok = Option<Patient>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Visit>, patient::Id>>,
            Ok = Vec<Visit>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Prescription>, visit::Id>>,
            Ok = Vec<Prescription>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Vec<Detailed>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: Authorized<OfPatient>,
    ) -> Result<Self::Ok, Self::Err> {
        query.check().map_err(tracerr::wrap!())?;
        let OfPatient(public_id) = query.query;

        let patient = self
            .database()
            .execute(Select(By::new(&public_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!())?
            .ok_or_else(|| {
                tracerr::new!(ExecutionError::PatientNotExists(public_id))
            })?;

        let visits = self
            .database()
            .execute(Select(By::new(patient.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!())?;

        let mut detailed = Vec::with_capacity(visits.len());
        for visit in visits {
            detailed.push(
                detail(self.database(), visit)
                    .await
                    .map_err(tracerr::wrap!())?,
            );
        }
        Ok(detailed)
    }
}

impl<Db, C> Query<Authorized<LastOwn>> for Service<Db, C>
where
    Db: for<'l> Database<
            Select<By<Option<Patient>, &'l patient::PublicId>>,
            Ok = Option<Patient>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Visit>, patient::Id>>,
            Ok = Option<Visit>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Prescription>, visit::Id>>,
            Ok = Vec<Prescription>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Option<Detailed>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: Authorized<LastOwn>,
    ) -> Result<Self::Ok, Self::Err> {
        query.check().map_err(tracerr::wrap!())?;

        let public_id = patient::PublicId::new(query.by.username.to_string())
            .ok_or_else(|| tracerr::new!(ExecutionError::NotPatient))?;
        let patient = self
            .database()
            .execute(Select(By::new(&public_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!())?
            .ok_or_else(|| tracerr::new!(ExecutionError::NotPatient))?;

        let Some(visit) = self
            .database()
            .execute(Select(By::new(patient.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!())?
        else {
            return Ok(None);
        };

        detail(self.database(), visit)
            .await
            .map(Some)
            .map_err(tracerr::wrap!())
    }
}

/// Loads the [`Prescription`]s of the provided [`Visit`].
async fn detail<Db>(
    db: &Db,
    visit: Visit,
) -> Result<Detailed, Traced<ExecutionError>>
where
    Db: Database<
        Select<By<Vec<Prescription>, visit::Id>>,
        Ok = Vec<Prescription>,
        Err = Traced<database::Error>,
    >,
{
    let prescriptions = db
        .execute(Select(By::new(visit.id)))
        .await
        .map_err(tracerr::map_from_and_wrap!())?;
    Ok(Detailed {
        visit,
        prescriptions,
    })
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{CreateVisit, UseVisitMedicine},
        domain::{account::Kind, medicine, patient, visit, Account},
        fixture::{self, TestService},
        query::{Authorized, ExecutionError},
        Command as _, Query as _,
    };

    use super::{LastOwn, OfPatient};

    fn public_id(id: &str) -> patient::PublicId {
        patient::PublicId::new(id).unwrap()
    }

    async fn visit(
        svc: &TestService,
        by: &Account,
        patient: &str,
        reason: visit::Reason,
        medicines: Vec<(medicine::Id, i32)>,
    ) -> crate::command::create_visit::Output {
        svc.execute(CreateVisit {
            by: by.clone(),
            patient: public_id(patient),
            reason,
            notes: String::new(),
            patient_weight: None,
            patient_height: None,
            medicines: medicines
                .into_iter()
                .map(|(id, n)| (id, medicine::Amount::new(n).unwrap()))
                .collect(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn lists_patient_visits_in_order() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;
        _ = fixture::patient(&svc, "P-1").await;
        _ = fixture::patient(&svc, "P-2").await;
        let med = fixture::medicine(&svc, "Octanate", 10).await;
        let first =
            visit(&svc, &sec, "P-1", visit::Reason::Surgery, vec![(med.id, 2)])
                .await;
        _ = visit(&svc, &sec, "P-2", visit::Reason::Surgery, vec![]).await;
        let second = visit(
            &svc,
            &sec,
            "P-1",
            visit::Reason::ActiveBleeding,
            vec![(med.id, 1)],
        )
        .await;

        let listed = svc
            .execute(Authorized::new(sec, OfPatient(public_id("P-1"))))
            .await
            .unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].visit, first.visit);
        assert_eq!(listed[0].prescriptions, first.prescriptions);
        assert_eq!(listed[1].visit, second.visit);
        assert_eq!(listed[1].prescriptions, second.prescriptions);
    }

    #[tokio::test]
    async fn fails_listing_unknown_patient() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;

        let err = svc
            .execute(Authorized::new(sec, OfPatient(public_id("P-404"))))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::PatientNotExists(id) if *id == public_id("P-404"),
        ));
    }

    #[tokio::test]
    async fn requires_read_other_visits_permission() {
        let svc = fixture::service();
        let patient =
            fixture::account(&svc, Kind::Patient, "P-1", "pass").await;
        _ = fixture::patient(&svc, "P-1").await;

        let err = svc
            .execute(Authorized::new(patient, OfPatient(public_id("P-1"))))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PermissionDenied));
    }

    #[tokio::test]
    async fn reads_own_last_visit() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;
        let own = fixture::account(&svc, Kind::Patient, "P-1", "pass").await;
        _ = fixture::patient(&svc, "P-1").await;
        _ = fixture::patient(&svc, "P-2").await;
        let med = fixture::medicine(&svc, "Octanate", 10).await;

        let none = svc
            .execute(Authorized::new(own.clone(), LastOwn))
            .await
            .unwrap();
        assert_eq!(none, None);

        _ = visit(&svc, &sec, "P-1", visit::Reason::Surgery, vec![]).await;
        let last = visit(
            &svc,
            &sec,
            "P-1",
            visit::Reason::HomeTreatment,
            vec![(med.id, 2)],
        )
        .await;
        _ = visit(&svc, &sec, "P-2", visit::Reason::Surgery, vec![]).await;
        let used = svc
            .execute(UseVisitMedicine {
                by: own.clone(),
                visit_id: last.visit.id,
                prescription_id: last.prescriptions[0].id,
            })
            .await
            .unwrap();

        let found = svc
            .execute(Authorized::new(own, LastOwn))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.visit, last.visit);
        assert_eq!(found.prescriptions.len(), 2);
        assert_eq!(found.prescriptions[0], used);
        assert_eq!(found.prescriptions[1].used_at, None);
    }

    #[tokio::test]
    async fn fails_without_patient_record() {
        let svc = fixture::service();
        let stray = fixture::account(&svc, Kind::Patient, "P-9", "pass").await;

        let err = svc
            .execute(Authorized::new(stray, LastOwn))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotPatient));
    }

    #[tokio::test]
    async fn requires_read_own_visit_permission() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;

        let err = svc
            .execute(Authorized::new(sec, LastOwn))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PermissionDenied));
    }
}
