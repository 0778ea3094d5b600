//! [`Medicine`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Decrement, Delete, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{medicine, Medicine},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns of a [`Medicine`] row.
const COLUMNS: &str = "\
    id, name, dose, unit, amount, \
    expires_at, received_at, \
    manufacturer, batch_number, factor_type, \
    created_at";

/// Reads a [`Medicine`] out of the provided [`Row`] with [`COLUMNS`].
fn from_row(row: &Row) -> Medicine {
    Medicine {
        id: row.get("id"),
        name: row.get("name"),
        dose: row.get("dose"),
        unit: row.get("unit"),
        amount: row.get("amount"),
        expires_at: row.get("expires_at"),
        received_at: row.get("received_at"),
        manufacturer: row.get("manufacturer"),
        batch_number: row.get("batch_number"),
        factor_type: row.get("factor_type"),
        created_at: row.get("created_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<medicine::Id, Medicine>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[medicine::Id]>,
{
    type Ok = HashMap<medicine::Id, Medicine>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<medicine::Id, Medicine>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        let ids: &[medicine::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT {COLUMNS} FROM medicines WHERE id = ANY($1::UUID[])",
        );
        Ok(self
            .query(&sql, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| {
                let medicine = from_row(row);
                (medicine.id, medicine)
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Medicine>, medicine::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<medicine::Id, Medicine>, [medicine::Id; 1]>>,
        Ok = HashMap<medicine::Id, Medicine>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Medicine>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Medicine>, medicine::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Vec<Medicine>, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Medicine>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Medicine>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql = format!(
            "SELECT {COLUMNS} FROM medicines ORDER BY created_at, id",
        );
        Ok(self
            .query(&sql, &[])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Medicine>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(medicine): Insert<Medicine>,
    ) -> Result<Self::Ok, Self::Err> {
        let Medicine {
            id,
            name,
            dose,
            unit,
            amount,
            expires_at,
            received_at,
            manufacturer,
            batch_number,
            factor_type,
            created_at,
        } = medicine;

        const SQL: &str = "\
            INSERT INTO medicines (\
                id, name, dose, unit, amount, \
                expires_at, received_at, \
                manufacturer, batch_number, factor_type, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::INT4, $4::VARCHAR, $5::INT4, \
                $6::TIMESTAMPTZ, $7::TIMESTAMPTZ, \
                $8::VARCHAR, $9::VARCHAR, $10::VARCHAR, \
                $11::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &name,
                &dose,
                &unit,
                &amount,
                &expires_at,
                &received_at,
                &manufacturer,
                &batch_number,
                &factor_type,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<By<Medicine, (medicine::Id, medicine::Amount)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Medicine>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<Medicine, (medicine::Id, medicine::Amount)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (id, amount) = by.into_inner();

        let sql = format!(
            "UPDATE medicines SET amount = $2::INT4 \
             WHERE id = $1::UUID \
             RETURNING {COLUMNS}",
        );
        Ok(self
            .query_opt(&sql, &[&id, &amount])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C>
    Database<
        Decrement<By<Option<medicine::Amount>, (medicine::Id, medicine::Amount)>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<medicine::Amount>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Decrement(by): Decrement<
            By<Option<medicine::Amount>, (medicine::Id, medicine::Amount)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (id, amount) = by.into_inner();

        const SQL: &str = "\
            UPDATE medicines \
            SET amount = amount - $2::INT4 \
            WHERE id = $1::UUID \
              AND amount >= $2::INT4 \
            RETURNING amount";
        Ok(self
            .query_opt(SQL, &[&id, &amount])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| row.get("amount")))
    }
}

impl<C> Database<Delete<By<Medicine, medicine::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Medicine>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Medicine, medicine::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "DELETE FROM medicines WHERE id = $1::UUID RETURNING {COLUMNS}",
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C, IDs> Database<Lock<By<Medicine, IDs>>> for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[medicine::Id]>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Medicine, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        let ids: &[medicine::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(());
        }

        // Rows are locked in a stable order to avoid deadlocks between
        // concurrent transactions locking overlapping sets.
        const SQL: &str = "\
            SELECT id FROM medicines \
            WHERE id = ANY($1::UUID[]) \
            ORDER BY id \
            FOR UPDATE";
        self.query(SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
