//! [`Command`] for updating an [`Account`].

use common::{
    operations::{By, Commit, Delete, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
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
    infra::{cache, database, Cache, Database, Sessions},
    Service,
};

use super::Command;

/// [`Command`] for updating an [`Account`].
///
/// Only the provided fields are overwritten. Cached sessions of the updated
/// [`Account`] are invalidated.
#[derive(Clone, Debug)]
pub struct UpdateAccount {
    /// [`Account`] performing this [`Command`].
    pub by: Account,

    /// ID of the [`Account`] to update.
    pub account_id: account::Id,

    /// New [`DisplayName`] of the [`Account`].
    pub display_name: Option<account::DisplayName>,

    /// New [`Username`] of the [`Account`].
    pub username: Option<account::Username>,

    /// New [`Password`] of the [`Account`].
    pub password: Option<SecretBox<account::Password>>,

    /// New [`Permissions`] of the [`Account`].
    ///
    /// Empty [`Permissions`] leave the current ones untouched.
    pub permissions: Option<Permissions>,
}

impl<Db, C> Command<UpdateAccount> for Service<Db, C>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Account>, account::Id>>,
            Ok = Option<Account>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Account, account::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<Account>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
    Sessions<C>: Cache<
        Delete<By<Account, account::Id>>,
        Ok = (),
        Err = Traced<cache::Error>,
    >,
{
    type Ok = Account;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateAccount) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateAccount {
            by,
            account_id,
            display_name,
            username,
            password,
            permissions,
        } = cmd;

        if !by.has_permission(Permissions::WRITE_ACCOUNTS) {
            return Err(tracerr::new!(E::PermissionDenied));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent updates of the same `Account`.
        tx.execute(Lock(By::new(account_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut account = tx
            .execute(Select(By::<Option<Account>, _>::new(account_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::AccountNotExists(account_id)))?;

        if let Some(name) = display_name {
            account.display_name = name;
        }
        if let Some(name) = username {
            account.username = name;
        }
        if let Some(pass) = password {
            let pass = pass.expose_secret();
            if !account.password_hash.verify(pass) {
                account.password_hash = account::PasswordHash::new(pass)
                    .map_err(tracerr::from_and_wrap!(=> E))?;
            }
        }
        if let Some(perms) = permissions.filter(|p| !p.is_empty()) {
            account.permissions = perms;
        }
        account.updated_at = DateTime::now().coerce();

        if let Err(e) = tx.execute(Update(account.clone())).await {
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
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        self.sessions()
            .execute(Delete(By::new(account.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(
            "`Account(id: {})` updated `Account(id: {})`",
            by.id,
            account.id,
        );

        Ok(account)
    }
}

/// Error of [`UpdateAccount`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Cache`] error.
    #[display("`Cache` operation failed: {_0}")]
    Cache(cache::Error),

    /// [`Password`] cannot be hashed.
    #[display("Failed to hash password: {_0}")]
    Hash(account::HashError),

    /// [`Account`] performing the [`Command`] lacks permissions.
    #[display("Permission denied")]
    #[from(ignore)]
    PermissionDenied,

    /// [`Account`] doesn't exist.
    #[display("`Account(id: {_0})` does not exist")]
    #[from(ignore)]
    AccountNotExists(#[error(not(source))] account::Id),

    /// [`Username`] is already occupied.
    #[display("`{_0}` username is occupied")]
    #[from(ignore)]
    UsernameOccupied(#[error(not(source))] account::Username),
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{
        command::{AuthenticateAccount, CreateAccountSession},
        domain::{
            account::{self, Kind, Password, Permissions, Username},
            Account,
        },
        fixture, Command as _,
    };

    use super::{ExecutionError, UpdateAccount};

    fn update(by: Account, account_id: account::Id) -> UpdateAccount {
        UpdateAccount {
            by,
            account_id,
            display_name: None,
            username: None,
            password: None,
            permissions: None,
        }
    }

    #[tokio::test]
    async fn fresh_permissions_are_seen_after_invalidation() {
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
        let cached = svc
            .execute(AuthenticateAccount {
                token: token.clone(),
            })
            .await
            .unwrap();
        assert_eq!(cached.permissions, Permissions::SECRETARY);

        _ = svc
            .execute(UpdateAccount {
                permissions: Some(Permissions::ADMIN),
                ..update(admin, sec.id)
            })
            .await
            .unwrap();

        let fresh = svc.execute(AuthenticateAccount { token }).await.unwrap();
        assert_eq!(fresh.permissions, Permissions::ADMIN);
    }

    #[tokio::test]
    async fn overwrites_only_provided_fields() {
        let svc = fixture::service();
        let admin = fixture::account(&svc, Kind::Admin, "admin", "pass").await;
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;

        let updated = svc
            .execute(UpdateAccount {
                username: Some(Username::new("sec2").unwrap()),
                permissions: Some(Permissions::NONE),
                ..update(admin, sec.id)
            })
            .await
            .unwrap();

        assert_eq!(updated.username.to_string(), "sec2");
        assert_eq!(updated.display_name, sec.display_name);
        assert_eq!(updated.password_hash, sec.password_hash);
        assert_eq!(updated.permissions, Permissions::SECRETARY);
    }

    #[tokio::test]
    async fn rehashes_only_changed_password() {
        let svc = fixture::service();
        let admin = fixture::account(&svc, Kind::Admin, "admin", "pass").await;
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;

        let same = svc
            .execute(UpdateAccount {
                password: Some(SecretBox::new(Box::new(Password::from("pass")))),
                ..update(admin.clone(), sec.id)
            })
            .await
            .unwrap();
        assert_eq!(same.password_hash, sec.password_hash);

        let changed = svc
            .execute(UpdateAccount {
                password: Some(SecretBox::new(Box::new(Password::from("new")))),
                ..update(admin, sec.id)
            })
            .await
            .unwrap();
        assert!(changed.password_hash.verify(&Password::from("new")));
    }

    #[tokio::test]
    async fn fails_on_missing_account_and_permissions() {
        let svc = fixture::service();
        let admin = fixture::account(&svc, Kind::Admin, "admin", "pass").await;
        let sec = fixture::account(&svc, Kind::Secretary, "sec1", "pass").await;

        let err = svc
            .execute(update(admin, account::Id::new()))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::AccountNotExists(_)));

        let err = svc.execute(update(sec.clone(), sec.id)).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::PermissionDenied));
    }
}
