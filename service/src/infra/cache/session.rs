//! Cache-aside storage of authenticated [`Account`]s by their session
//! [`Token`]s.

use std::time::Duration;

use common::operations::{By, Delete, Insert, Select};
use tracerr::Traced;
use tracing as log;

use crate::domain::{
    account::{self, session::Token},
    Account,
};

use super::{Cache, Entry, Error, Key};

/// [`Cache`] of authenticated [`Account`]s over a key-value backend `B`.
///
/// Stores two entries per session, both living for the session TTL:
/// - `clinic:account-session-token:{token}` holding the [`Account`] snapshot;
/// - `clinic:account-id-to-token:{id}` holding the last issued [`Token`].
#[derive(Clone, Debug)]
pub struct Sessions<B> {
    /// Key-value backend.
    backend: B,

    /// Time entries live for.
    ttl: Duration,
}

impl<B> Sessions<B> {
    /// Creates new [`Sessions`] over the provided `backend`.
    #[must_use]
    pub fn new(backend: B, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// Returns the key-value backend of these [`Sessions`].
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the [`Key`] of an [`Account`] snapshot stored by its [`Token`].
    fn token_key(token: &Token) -> Key {
        Key::new("account-session-token", token)
    }

    /// Returns the [`Key`] of a [`Token`] stored by its [`Account`] ID.
    fn account_key(id: account::Id) -> Key {
        Key::new("account-id-to-token", id)
    }
}

impl<B> Cache<Insert<(Token, Account)>> for Sessions<B>
where
    B: Cache<Insert<Entry>, Ok = (), Err = Traced<Error>>,
{
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Insert((token, account)): Insert<(Token, Account)>,
    ) -> Result<Self::Ok, Self::Err> {
        let snapshot = serde_json::to_string(&account)
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        self.backend
            .execute(Insert(Entry {
                key: Self::account_key(account.id),
                value: token.to_string(),
                ttl: self.ttl,
            }))
            .await
            .map_err(tracerr::wrap!())?;
        self.backend
            .execute(Insert(Entry {
                key: Self::token_key(&token),
                value: snapshot,
                ttl: self.ttl,
            }))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<B> Cache<Select<By<Option<Account>, &Token>>> for Sessions<B>
where
    B: Cache<
        Select<By<Option<String>, Key>>,
        Ok = Option<String>,
        Err = Traced<Error>,
    >,
{
    type Ok = Option<Account>;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Account>, &Token>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Some(snapshot) = self
            .backend
            .execute(Select(By::new(Self::token_key(by.into_inner()))))
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        // Undecodable snapshot is left to be overwritten on the next login.
        Ok(serde_json::from_str(&snapshot)
            .inspect_err(|e| {
                log::warn!("discarding malformed cached `Account`: {e}");
            })
            .ok())
    }
}

impl<B> Cache<Delete<By<Account, &Token>>> for Sessions<B>
where
    B: Cache<Delete<Key>, Ok = (), Err = Traced<Error>>,
{
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Account, &Token>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.backend
            .execute(Delete(Self::token_key(by.into_inner())))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<B> Cache<Delete<By<Account, account::Id>>> for Sessions<B>
where
    B: Cache<
            Select<By<Option<String>, Key>>,
            Ok = Option<String>,
            Err = Traced<Error>,
        > + Cache<Delete<Key>, Ok = (), Err = Traced<Error>>,
{
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Account, account::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let account_key = Self::account_key(by.into_inner());

        let token = self
            .backend
            .execute(Select(By::new(account_key.clone())))
            .await
            .map_err(tracerr::wrap!())?;
        self.backend
            .execute(Delete(account_key))
            .await
            .map_err(tracerr::wrap!())?;

        if let Some(token) = token {
            let key = Self::token_key(&Token::from(token));
            if let Err(e) = self.backend.execute(Delete(key)).await {
                log::debug!("failed to delete cached `Account` session: {e}");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{
        operations::{By, Delete, Insert, Select},
        DateTime,
    };

    use crate::{
        domain::{
            account::{
                self, session::Token, DisplayName, Kind, Password,
                PasswordHash, Permissions, Username,
            },
            Account,
        },
        infra::cache::{self, Cache as _},
    };

    use super::Sessions;

    fn account() -> Account {
        Account {
            id: account::Id::new(),
            display_name: DisplayName::new("Secretary").unwrap(),
            username: Username::new("sec1").unwrap(),
            password_hash: PasswordHash::new(&Password::from("pass")).unwrap(),
            kind: Kind::Secretary,
            permissions: Permissions::SECRETARY,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        }
    }

    fn sessions() -> Sessions<cache::Memory> {
        Sessions::new(cache::Memory::new(), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn puts_and_gets() {
        let sessions = sessions();
        let (token, acc) = (Token::from("t1".to_owned()), account());

        assert_eq!(
            sessions.execute(Select(By::new(&token))).await.unwrap(),
            None,
        );

        sessions
            .execute(Insert((token.clone(), acc.clone())))
            .await
            .unwrap();
        assert_eq!(
            sessions.execute(Select(By::new(&token))).await.unwrap(),
            Some(acc),
        );
        assert_eq!(sessions.backend().len(), 2);
    }

    #[tokio::test]
    async fn invalidates_by_token_idempotently() {
        let sessions = sessions();
        let (token, acc) = (Token::from("t1".to_owned()), account());
        sessions
            .execute(Insert((token.clone(), acc)))
            .await
            .unwrap();

        for _ in 0..2 {
            sessions.execute(Delete(By::new(&token))).await.unwrap();
            assert_eq!(
                sessions.execute(Select(By::new(&token))).await.unwrap(),
                None,
            );
        }
    }

    #[tokio::test]
    async fn invalidates_by_account_id() {
        let sessions = sessions();
        let (token, acc) = (Token::from("t1".to_owned()), account());
        let id = acc.id;
        sessions
            .execute(Insert((token.clone(), acc)))
            .await
            .unwrap();

        sessions.execute(Delete(By::new(id))).await.unwrap();

        assert_eq!(
            sessions.execute(Select(By::new(&token))).await.unwrap(),
            None,
        );
        assert!(sessions.backend().is_empty());

        // Nothing cached for the account anymore.
        sessions.execute(Delete(By::new(id))).await.unwrap();
    }

    #[tokio::test]
    async fn malformed_snapshot_is_a_miss() {
        let sessions = sessions();
        let token = Token::from("t1".to_owned());
        sessions
            .backend()
            .execute(Insert(cache::Entry {
                key: Sessions::<cache::Memory>::token_key(&token),
                value: "{".into(),
                ttl: Duration::from_secs(60),
            }))
            .await
            .unwrap();

        assert_eq!(
            sessions.execute(Select(By::new(&token))).await.unwrap(),
            None,
        );
    }
}
