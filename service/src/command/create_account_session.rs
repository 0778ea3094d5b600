//! [`Command`] for logging into an [`Account`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::account::{session::Token, Password, Username};
use crate::{
    domain::{
        account::{self, session, Session},
        Account,
    },
    infra::{database, token, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Session`] of an [`Account`] by its
/// credentials.
#[derive(Clone, Debug)]
pub struct CreateAccountSession {
    /// [`Username`] of the [`Account`].
    pub username: account::Username,

    /// [`Password`] of the [`Account`].
    pub password: SecretBox<account::Password>,
}

/// Output of [`CreateAccountSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`Token`] of the created [`Session`].
    pub token: session::Token,

    /// [`Account`] whose [`Session`] has been created.
    pub account: Account,

    /// [`DateTime`] when the [`Session`] expires.
    ///
    /// [`DateTime`]: common::DateTime
    pub expires_at: session::ExpirationDateTime,
}

impl<Db, C> Command<CreateAccountSession> for Service<Db, C>
where
    Db: for<'l> Database<
        Select<By<Option<Account>, &'l account::Username>>,
        Ok = Option<Account>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateAccountSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateAccountSession { username, password } = cmd;

        // Unknown username and wrong password are indistinguishable outside.
        let account = self
            .database()
            .execute(Select(By::new(&username)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|acc| acc.password_hash.verify(password.expose_secret()))
            .ok_or_else(|| {
                log::warn!("rejected login of `{username}`");
                tracerr::new!(E::InvalidCredentials)
            })?;

        let signed = self
            .tokens()
            .sign(
                Session::of(&account),
                token::Purpose::Session,
                self.config().session_ttl,
            )
            .map_err(tracerr::from_and_wrap!(=> E))?;

        log::info!("`Account(id: {})` logged in", account.id);

        Ok(Output {
            token: signed.token.into(),
            account,
            expires_at: signed.expires_at.coerce(),
        })
    }
}

/// Error of [`CreateAccountSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`token::Issuer`] error.
    #[display("Failed to sign a session token: {_0}")]
    Token(token::Error),

    /// Provided credentials don't match any [`Account`].
    #[display("Invalid login credentials")]
    InvalidCredentials,
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{
        domain::account::{Kind, Password, Username},
        fixture, Command as _,
    };

    use super::{CreateAccountSession, ExecutionError};

    fn login(username: &str, password: &str) -> CreateAccountSession {
        CreateAccountSession {
            username: Username::new(username).unwrap(),
            password: SecretBox::new(Box::new(Password::from(password))),
        }
    }

    #[tokio::test]
    async fn issues_token_for_valid_credentials() {
        let svc = fixture::service();
        let acc = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;

        let out = svc.execute(login("sec1", "pass")).await.unwrap();

        assert_eq!(out.account, acc);
        assert!(!out.token.to_string().is_empty());
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let svc = fixture::service();
        _ = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;

        let err = svc.execute(login("sec1", "wrong")).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvalidCredentials));
    }

    #[tokio::test]
    async fn rejects_unknown_username_the_same_way() {
        let svc = fixture::service();

        let err = svc.execute(login("nobody", "pass")).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvalidCredentials));
    }
}
