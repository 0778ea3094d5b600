//! [`Query`] collection related to a single [`Account`].

use common::operations::By;

use crate::domain::{
    account::{self, Permissions},
    Account,
};
#[cfg(doc)]
use crate::Query;

use super::{DatabaseQuery, Restricted};

/// Queries an [`Account`] by its [`account::Id`].
pub type ById = DatabaseQuery<By<Option<Account>, account::Id>>;

impl Restricted for ById {
    const REQUIRED: Permissions = Permissions::READ_ACCOUNTS;
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::account::{self, Kind},
        fixture,
        query::{Authorized, ExecutionError},
        Query as _,
    };

    use super::ById;

    #[tokio::test]
    async fn reads_account() {
        let svc = fixture::service();
        let admin = fixture::account(&svc, Kind::Admin, "admin", "pass").await;
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;

        let found = svc
            .execute(Authorized::new(admin.clone(), ById::by(sec.id)))
            .await
            .unwrap();
        assert_eq!(found, Some(sec));

        let missing = svc
            .execute(Authorized::new(admin, ById::by(account::Id::new())))
            .await
            .unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn requires_read_accounts_permission() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;

        let err = svc
            .execute(Authorized::new(sec.clone(), ById::by(sec.id)))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PermissionDenied));
    }
}
