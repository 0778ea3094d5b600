//! [`Command`] for creating a new staff [`Account`].

use common::{operations::Insert, DateTime};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::account::{DisplayName, Password, Username};
use crate::{
    domain::{
        account::{self, Permissions},
        Account,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Account`] of clinic staff.
#[derive(Clone, Debug)]
pub struct CreateAccount {
    /// [`Account`] performing this [`Command`].
    pub by: Account,

    /// [`account::Kind`] of the new [`Account`].
    ///
    /// Only [`account::Kind::Admin`] and [`account::Kind::Secretary`] are
    /// allowed.
    pub kind: account::Kind,

    /// [`DisplayName`] of the new [`Account`].
    pub display_name: account::DisplayName,

    /// [`Username`] of the new [`Account`].
    pub username: account::Username,

    /// [`Password`] of the new [`Account`].
    pub password: SecretBox<account::Password>,
}

impl<Db, C> Command<CreateAccount> for Service<Db, C>
where
    Db: Database<Insert<Account>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Account;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateAccount) -> Result<Self::Ok, Self::Err> {
        use account::Kind;
        use ExecutionError as E;

        let CreateAccount {
            by,
            kind,
            display_name,
            username,
            password,
        } = cmd;

        if !by.has_permission(Permissions::WRITE_ACCOUNTS) {
            return Err(tracerr::new!(E::PermissionDenied));
        }
        match kind {
            Kind::Admin | Kind::Secretary => {}
            Kind::SuperAdmin | Kind::Patient => {
                return Err(tracerr::new!(E::ForbiddenKind(kind)));
            }
        }

        let password_hash = account::PasswordHash::new(password.expose_secret())
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let now = DateTime::now();
        let account = Account {
            id: account::Id::new(),
            display_name,
            username,
            password_hash,
            kind,
            permissions: kind.default_permissions(),
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        if let Err(e) = self.database().execute(Insert(account.clone())).await {
            return Err(
                if e.as_ref().is_unique_violation(Some(
                    database::constraint::ACCOUNTS_USERNAME_KEY,
                )) {
                    tracerr::new!(E::UsernameOccupied(account.username))
                } else {
                    tracerr::map_from(e)
                },
            );
        }

        log::info!(
            "`Account(id: {})` created `{kind}` `Account(id: {})`",
            by.id,
            account.id,
        );

        Ok(account)
    }
}

/// Error of [`CreateAccount`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Password`] cannot be hashed.
    #[display("Failed to hash password: {_0}")]
    Hash(account::HashError),

    /// [`Account`] performing the [`Command`] lacks permissions.
    #[display("Permission denied")]
    #[from(ignore)]
    PermissionDenied,

    /// Requested [`account::Kind`] cannot be created.
    #[display("`{_0}` accounts cannot be created")]
    #[from(ignore)]
    ForbiddenKind(#[error(not(source))] account::Kind),

    /// [`Username`] is already occupied.
    #[display("`{_0}` username is occupied")]
    #[from(ignore)]
    UsernameOccupied(#[error(not(source))] account::Username),
}
