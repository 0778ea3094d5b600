//! [`Command`] for checking whether a [`Session`] is alive.

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::account::Session;
use crate::{
    domain::{account::session, Account},
    infra::{cache, Cache, Sessions},
    Service,
};

use super::Command;

/// [`Command`] for checking whether a [`Session`] token is currently held in
/// the [`Sessions`] cache.
///
/// Doesn't fall back to the database: a [`Session`] evicted from the cache is
/// reported as not alive until it's authenticated again.
#[derive(Clone, Debug, From)]
pub struct CheckAccountSession {
    /// [`Session`] token to check.
    pub token: session::Token,
}

impl<Db, C> Command<CheckAccountSession> for Service<Db, C>
where
    Sessions<C>: for<'t> Cache<
        Select<By<Option<Account>, &'t session::Token>>,
        Ok = Option<Account>,
        Err = Traced<cache::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CheckAccountSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CheckAccountSession { token } = cmd;

        self.sessions()
            .execute(Select(By::new(&token)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .map(drop)
            .ok_or_else(|| tracerr::new!(E::NotAlive))
    }
}

/// Error of [`CheckAccountSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Cache`] error.
    #[display("`Cache` operation failed: {_0}")]
    Cache(cache::Error),

    /// [`Session`] is not held in the cache.
    #[display("Session is not alive")]
    NotAlive,
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{
        command::{AuthenticateAccount, CreateAccountSession},
        domain::account::{Kind, Password, Username},
        fixture, Command as _,
    };

    use super::{CheckAccountSession, ExecutionError};

    #[tokio::test]
    async fn consults_only_the_cache() {
        let svc = fixture::service();
        _ = fixture::account(&svc, Kind::Admin, "admin", "pass").await;
        let token = svc
            .execute(CreateAccountSession {
                username: Username::new("admin").unwrap(),
                password: SecretBox::new(Box::new(Password::from("pass"))),
            })
            .await
            .unwrap()
            .token;

        // A valid token not yet cached is reported as not alive.
        let err = svc
            .execute(CheckAccountSession {
                token: token.clone(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotAlive));

        _ = svc
            .execute(AuthenticateAccount {
                token: token.clone(),
            })
            .await
            .unwrap();

        svc.execute(CheckAccountSession { token }).await.unwrap();
    }
}
