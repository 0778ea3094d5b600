//! [`Account`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{account, Account},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns of an [`Account`] row.
const COLUMNS: &str = "\
    id, display_name, username, password_hash, \
    kind, permissions, \
    created_at, updated_at";

/// Reads an [`Account`] out of the provided [`Row`] with [`COLUMNS`].
fn from_row(row: &Row) -> Account {
    Account {
        id: row.get("id"),
        display_name: row.get("display_name"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        kind: row.get("kind"),
        permissions: row.get("permissions"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Account>, account::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Account>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Account>, account::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!("SELECT {COLUMNS} FROM accounts WHERE id = $1::UUID");
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<'l, C> Database<Select<By<Option<Account>, &'l account::Username>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Account>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Account>, &'l account::Username>>,
    ) -> Result<Self::Ok, Self::Err> {
        let username = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} FROM accounts WHERE username = $1::VARCHAR",
        );
        Ok(self
            .query_opt(&sql, &[&username])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Account>, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Account>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Account>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql = format!("SELECT {COLUMNS} FROM accounts ORDER BY created_at");
        Ok(self
            .query(&sql, &[])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Account>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(account): Insert<Account>,
    ) -> Result<Self::Ok, Self::Err> {
        let Account {
            id,
            display_name,
            username,
            password_hash,
            kind,
            permissions,
            created_at,
            updated_at,
        } = account;

        const SQL: &str = "\
            INSERT INTO accounts (\
                id, display_name, username, password_hash, \
                kind, permissions, \
                created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::VARCHAR, \
                $5::INT2, $6::INT8, \
                $7::TIMESTAMPTZ, $8::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &display_name,
                &username,
                &password_hash,
                &kind,
                &permissions,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Account>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(account): Update<Account>,
    ) -> Result<Self::Ok, Self::Err> {
        let Account {
            id,
            display_name,
            username,
            password_hash,
            kind,
            permissions,
            created_at: _,
            updated_at,
        } = account;

        const SQL: &str = "\
            UPDATE accounts \
            SET display_name = $2::VARCHAR, \
                username = $3::VARCHAR, \
                password_hash = $4::VARCHAR, \
                kind = $5::INT2, \
                permissions = $6::INT8, \
                updated_at = $7::TIMESTAMPTZ \
            WHERE id = $1::UUID";
        self.exec(
            SQL,
            &[
                &id,
                &display_name,
                &username,
                &password_hash,
                &kind,
                &permissions,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Account, account::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Account>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Account, account::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "DELETE FROM accounts WHERE id = $1::UUID RETURNING {COLUMNS}",
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Lock<By<Account, account::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Account, account::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id FROM accounts \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
