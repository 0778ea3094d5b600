//! [`Command`] for seeding the super-admin [`Account`].

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        account::{self, Permissions},
        Account,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating the super-admin [`Account`] if it doesn't exist
/// yet.
///
/// Executing it repeatedly returns the already existing [`Account`] without
/// touching it.
#[derive(Clone, Debug)]
pub struct CreateSuperAdmin {
    /// [`account::Username`] of the super-admin.
    pub username: account::Username,

    /// [`account::Password`] of the super-admin.
    pub password: SecretBox<account::Password>,

    /// [`account::DisplayName`] of the super-admin.
    pub display_name: account::DisplayName,
}

impl<Db, C> Command<CreateSuperAdmin> for Service<Db, C>
where
    Db: for<'u> Database<
            Select<By<Option<Account>, &'u account::Username>>,
            Ok = Option<Account>,
            Err = Traced<database::Error>,
        > + Database<Insert<Account>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Account;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateSuperAdmin,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateSuperAdmin {
            username,
            password,
            display_name,
        } = cmd;

        if let Some(existing) = self
            .database()
            .execute(Select(By::new(&username)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            if existing.kind != account::Kind::SuperAdmin {
                return Err(tracerr::new!(E::UsernameOccupied(username)));
            }
            log::debug!("super-admin `{username}` already exists");
            return Ok(existing);
        }

        let password_hash = account::PasswordHash::new(password.expose_secret())
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let now = DateTime::now();
        let account = Account {
            id: account::Id::new(),
            display_name,
            username,
            password_hash,
            kind: account::Kind::SuperAdmin,
            permissions: Permissions::ALL,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };
        self.database()
            .execute(Insert(account.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(
            "created super-admin `{}` as `Account(id: {})`",
            account.username,
            account.id,
        );

        Ok(account)
    }
}

/// Error of [`CreateSuperAdmin`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`account::Password`] cannot be hashed.
    #[display("Failed to hash password: {_0}")]
    Hash(account::HashError),

    /// [`account::Username`] belongs to a non-super-admin [`Account`].
    #[display("`{_0}` username is occupied")]
    #[from(ignore)]
    UsernameOccupied(#[error(not(source))] account::Username),
}
