//! [`Patient`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{patient, Patient},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<'l, C> Database<Select<By<Option<Patient>, &'l patient::PublicId>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Patient>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Patient>, &'l patient::PublicId>>,
    ) -> Result<Self::Ok, Self::Err> {
        let public_id = by.into_inner();

        const SQL: &str = "\
            SELECT id, public_id, name, created_at \
            FROM patients \
            WHERE public_id = $1::VARCHAR";
        Ok(self
            .query_opt(SQL, &[&public_id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Patient {
                id: row.get("id"),
                public_id: row.get("public_id"),
                name: row.get("name"),
                created_at: row.get("created_at"),
            }))
    }
}

impl<C> Database<Insert<Patient>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(patient): Insert<Patient>,
    ) -> Result<Self::Ok, Self::Err> {
        let Patient {
            id,
            public_id,
            name,
            created_at,
        } = patient;

        const SQL: &str = "\
            INSERT INTO patients (id, public_id, name, created_at) \
            VALUES ($1::UUID, $2::VARCHAR, $3::VARCHAR, $4::TIMESTAMPTZ)";
        self.exec(SQL, &[&id, &public_id, &name, &created_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
