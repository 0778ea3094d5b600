//! [`Query`] collection related to the multiple [`Medicine`]s.

use common::operations::By;

use crate::domain::{account::Permissions, Medicine};
#[cfg(doc)]
use crate::Query;

use super::{DatabaseQuery, Restricted};

/// Queries all the [`Medicine`]s in order of their registration.
pub type All = DatabaseQuery<By<Vec<Medicine>, ()>>;

impl Restricted for All {
    const REQUIRED: Permissions = Permissions::READ_MEDICINE;
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::account::Kind,
        fixture,
        query::{medicine, Authorized, ExecutionError},
        Query as _,
    };

    use super::All;

    #[tokio::test]
    async fn lists_and_reads_stock() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;
        let first = fixture::medicine(&svc, "Octanate", 5).await;
        let second = fixture::medicine(&svc, "Hemlibra", 3).await;

        let all = svc
            .execute(Authorized::new(sec.clone(), All::by(())))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&first));
        assert!(all.contains(&second));

        let one = svc
            .execute(Authorized::new(sec, medicine::ById::by(second.id)))
            .await
            .unwrap();
        assert_eq!(one, Some(second));
    }

    #[tokio::test]
    async fn requires_read_medicine_permission() {
        let svc = fixture::service();
        let patient =
            fixture::account(&svc, Kind::Patient, "patient", "pass").await;

        let err = svc
            .execute(Authorized::new(patient, All::by(())))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PermissionDenied));
    }
}
