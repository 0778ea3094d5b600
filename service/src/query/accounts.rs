//! [`Query`] collection related to the multiple [`Account`]s.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{
        account::{Kind, Permissions},
        Account,
    },
    infra::{database, Database},
    Query, Service,
};

use super::{Authorized, ExecutionError, Restricted};

/// Queries all the staff [`Account`]s.
///
/// Super-admin and patient [`Account`]s are never listed.
#[derive(Clone, Copy, Debug, Default)]
pub struct All;

impl Restricted for All {
    const REQUIRED: Permissions = Permissions::READ_ACCOUNTS;
}

impl<Db, C> Query<Authorized<All>> for Service<Db, C>
where
    Db: Database<
        Select<By<Vec<Account>, ()>>,
        Ok = Vec<Account>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Account>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: Authorized<All>,
    ) -> Result<Self::Ok, Self::Err> {
        query.check().map_err(tracerr::wrap!())?;

        let mut accounts = self
            .database()
            .execute(Select(By::new(())))
            .await
            .map_err(tracerr::map_from_and_wrap!())?;
        accounts.retain(|a| matches!(a.kind, Kind::Admin | Kind::Secretary));

        Ok(accounts)
    }
}

#[cfg(test)]
mod spec {
    use std::collections::HashSet;

    use crate::{
        domain::account::Kind,
        fixture,
        query::{Authorized, ExecutionError},
        Query as _,
    };

    use super::All;

    #[tokio::test]
    async fn lists_only_staff() {
        let svc = fixture::service();
        let root = fixture::account(&svc, Kind::SuperAdmin, "root", "pass").await;
        let admin = fixture::account(&svc, Kind::Admin, "admin", "pass").await;
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;
        _ = fixture::account(&svc, Kind::Patient, "patient", "pass").await;

        let listed = svc
            .execute(Authorized::new(root, All))
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect::<HashSet<_>>();

        assert_eq!(listed, HashSet::from([admin.id, sec.id]));
    }

    #[tokio::test]
    async fn requires_read_accounts_permission() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;

        let err = svc.execute(Authorized::new(sec, All)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PermissionDenied));
    }
}
