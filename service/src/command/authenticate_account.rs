//! [`Command`] for authenticating an [`Account`] by its [`Session`] token.

use common::operations::{By, Insert, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        account::{self, session, Session},
        Account,
    },
    infra::{cache, database, token, Cache, Database, Sessions},
    Service,
};

use super::Command;

/// [`Command`] for resolving the [`Account`] of a [`Session`] token.
///
/// The [`Account`] is looked up in the [`Sessions`] cache first, falling
/// back to the [`Database`] and repopulating the cache on a miss.
#[derive(Clone, Debug, From)]
pub struct AuthenticateAccount {
    /// [`Session`] token to authenticate.
    pub token: session::Token,
}

impl<Db, C> Command<AuthenticateAccount> for Service<Db, C>
where
    Db: for<'l> Database<
        Select<By<Option<Account>, &'l account::Username>>,
        Ok = Option<Account>,
        Err = Traced<database::Error>,
    >,
    Sessions<C>: for<'t> Cache<
            Select<By<Option<Account>, &'t session::Token>>,
            Ok = Option<Account>,
            Err = Traced<cache::Error>,
        > + Cache<
            Insert<(session::Token, Account)>,
            Ok = (),
            Err = Traced<cache::Error>,
        >,
{
    type Ok = Account;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthenticateAccount,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthenticateAccount { token } = cmd;

        let username = self
            .tokens()
            .decode::<Session>(token.as_ref(), token::Purpose::Session)
            .map_err(tracerr::from_and_wrap!(=> E))?
            .username()
            .ok_or_else(|| tracerr::new!(E::InvalidSession))?;

        if let Some(account) = self
            .sessions()
            .execute(Select(By::new(&token)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            return Ok(account);
        }
        log::debug!("session cache miss for `{username}`");

        let account = self
            .database()
            .execute(Select(By::new(&username)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::AccountNotExists(username)))?;

        self.sessions()
            .execute(Insert((token, account.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(account)
    }
}

/// Error of [`AuthenticateAccount`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Cache`] error.
    #[display("`Cache` operation failed: {_0}")]
    Cache(cache::Error),

    /// [`Session`] token cannot be decoded.
    #[display("Invalid session token: {_0}")]
    Token(token::Error),

    /// Decoded [`Session`] misses some of its claims.
    #[display("Invalid session token: incomplete claims")]
    InvalidSession,

    /// [`Account`] the [`Session`] belongs to does not exist.
    #[display("`Account(username: {_0})` does not exist")]
    #[from(ignore)]
    AccountNotExists(#[error(not(source))] account::Username),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{
        operations::{By, Select},
        DateTime,
    };

    use crate::{
        command::CreateAccountSession,
        domain::{
            account::{
                session::{Session, Token},
                Kind, Password, Username,
            },
            Account,
        },
        fixture,
        infra::{token::Purpose, Cache as _},
        Command as _,
    };

    use super::{AuthenticateAccount, ExecutionError};

    #[tokio::test]
    async fn falls_back_to_database_on_cold_cache() {
        let svc = fixture::service();
        let acc = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;
        let out = svc
            .execute(CreateAccountSession {
                username: Username::new("sec1").unwrap(),
                password: secrecy::SecretBox::new(Box::new(Password::from(
                    "pass",
                ))),
            })
            .await
            .unwrap();
        assert!(svc.sessions().backend().is_empty());

        let authed = svc
            .execute(AuthenticateAccount {
                token: out.token.clone(),
            })
            .await
            .unwrap();

        assert_eq!(authed, acc);
        let cached = svc
            .sessions()
            .execute(Select(By::<Option<Account>, _>::new(&out.token)))
            .await
            .unwrap();
        assert_eq!(cached, Some(acc));
    }

    #[tokio::test]
    async fn rejects_garbage_token() {
        let svc = fixture::service();

        let err = svc
            .execute(AuthenticateAccount {
                token: Token::from("not-a-token".to_owned()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Token(_)));
    }

    #[tokio::test]
    async fn rejects_incomplete_claims() {
        let svc = fixture::service();
        let signed = svc
            .tokens()
            .sign(
                Session {
                    name: String::new(),
                    username: "sec1".into(),
                    created_at: DateTime::now().coerce(),
                },
                Purpose::Session,
                Duration::from_secs(60),
            )
            .unwrap();

        let err = svc
            .execute(AuthenticateAccount {
                token: Token::from(signed.token),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvalidSession));
    }

    #[tokio::test]
    async fn fails_for_deleted_account() {
        let svc = fixture::service();
        let signed = svc
            .tokens()
            .sign(
                Session {
                    name: "Ghost".into(),
                    username: "ghost".into(),
                    created_at: DateTime::now().coerce(),
                },
                Purpose::Session,
                Duration::from_secs(60),
            )
            .unwrap();

        let err = svc
            .execute(AuthenticateAccount {
                token: Token::from(signed.token),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::AccountNotExists(_)));
    }
}
