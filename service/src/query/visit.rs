//! [`Query`] collection related to a single [`Visit`].

use common::operations::By;

#[cfg(doc)]
use crate::{domain::Visit, Query};
use crate::domain::{account::Permissions, visit, Prescription};

use super::{DatabaseQuery, Restricted};

/// Queries all the [`Prescription`]s of a [`Visit`].
pub type Prescriptions = DatabaseQuery<By<Vec<Prescription>, visit::Id>>;

impl Restricted for Prescriptions {
    const REQUIRED: Permissions = Permissions::READ_OTHER_VISITS;
}

#[cfg(test)]
mod spec {
    use crate::{
        command::CreateVisit,
        domain::{account::Kind, medicine, patient, visit},
        fixture,
        query::{Authorized, ExecutionError},
        Command as _, Query as _,
    };

    use super::Prescriptions;

    #[tokio::test]
    async fn lists_visit_prescriptions() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;
        _ = fixture::patient(&svc, "P-1").await;
        let med = fixture::medicine(&svc, "Octanate", 5).await;
        let out = svc
            .execute(CreateVisit {
                by: sec.clone(),
                patient: patient::PublicId::new("P-1").unwrap(),
                reason: visit::Reason::ActiveBleeding,
                notes: String::new(),
                patient_weight: None,
                patient_height: None,
                medicines: vec![(med.id, medicine::Amount::new(3).unwrap())],
            })
            .await
            .unwrap();

        let listed = svc
            .execute(Authorized::new(
                sec.clone(),
                Prescriptions::by(out.visit.id),
            ))
            .await
            .unwrap();
        assert_eq!(listed, out.prescriptions);

        let none = svc
            .execute(Authorized::new(sec, Prescriptions::by(visit::Id::new())))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn requires_read_other_visits_permission() {
        let svc = fixture::service();
        let patient =
            fixture::account(&svc, Kind::Patient, "patient", "pass").await;

        let err = svc
            .execute(Authorized::new(
                patient,
                Prescriptions::by(visit::Id::new()),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PermissionDenied));
    }
}
