//! [`Command`] for deleting an [`Account`].

use common::operations::{By, Delete};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        account::{self, Permissions},
        Account,
    },
    infra::{cache, database, Cache, Database, Sessions},
    Service,
};

use super::Command;

/// [`Command`] for deleting an [`Account`] along with its cached sessions.
#[derive(Clone, Debug)]
pub struct DeleteAccount {
    /// [`Account`] performing this [`Command`].
    pub by: Account,

    /// ID of the [`Account`] to delete.
    pub account_id: account::Id,
}

impl<Db, C> Command<DeleteAccount> for Service<Db, C>
where
    Db: Database<
        Delete<By<Account, account::Id>>,
        Ok = Option<Account>,
        Err = Traced<database::Error>,
    >,
    Sessions<C>: Cache<
        Delete<By<Account, account::Id>>,
        Ok = (),
        Err = Traced<cache::Error>,
    >,
{
    type Ok = Account;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteAccount) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteAccount { by, account_id } = cmd;

        if !by.has_permission(Permissions::WRITE_ACCOUNTS) {
            return Err(tracerr::new!(E::PermissionDenied));
        }

        let account = self
            .database()
            .execute(Delete(By::new(account_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::AccountNotExists(account_id)))?;

        self.sessions()
            .execute(Delete(By::new(account_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(
            "`Account(id: {})` deleted `Account(id: {account_id})`",
            by.id,
        );

        Ok(account)
    }
}

/// Error of [`DeleteAccount`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Cache`] error.
    #[display("`Cache` operation failed: {_0}")]
    Cache(cache::Error),

    /// [`Account`] performing the [`Command`] lacks permissions.
    #[display("Permission denied")]
    #[from(ignore)]
    PermissionDenied,

    /// [`Account`] doesn't exist.
    #[display("`Account(id: {_0})` does not exist")]
    #[from(ignore)]
    AccountNotExists(#[error(not(source))] account::Id),
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{
        command::{
            AuthenticateAccount, CheckAccountSession, CreateAccountSession,
        },
        domain::account::{Kind, Password, Username},
        fixture, Command as _,
    };

    use super::{DeleteAccount, ExecutionError};

    #[tokio::test]
    async fn drops_cached_sessions() {
        let svc = fixture::service();
        let admin = fixture::account(&svc, Kind::Admin, "admin", "pass").await;
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;
        let token = svc
            .execute(CreateAccountSession {
                username: Username::new("sec1").unwrap(),
                password: SecretBox::new(Box::new(Password::from("pass"))),
            })
            .await
            .unwrap()
            .token;
        _ = svc
            .execute(AuthenticateAccount {
                token: token.clone(),
            })
            .await
            .unwrap();

        let deleted = svc
            .execute(DeleteAccount {
                by: admin.clone(),
                account_id: sec.id,
            })
            .await
            .unwrap();
        assert_eq!(deleted, sec);

        assert!(svc
            .execute(CheckAccountSession {
                token: token.clone(),
            })
            .await
            .is_err());
        assert!(svc.execute(AuthenticateAccount { token }).await.is_err());

        let err = svc
            .execute(DeleteAccount {
                by: admin,
                account_id: sec.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::AccountNotExists(_)));
    }

    #[tokio::test]
    async fn requires_write_accounts_permission() {
        let svc = fixture::service();
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;

        let err = svc
            .execute(DeleteAccount {
                by: sec.clone(),
                account_id: sec.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PermissionDenied));
    }
}
