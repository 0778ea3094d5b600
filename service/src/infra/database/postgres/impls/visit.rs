//! [`Visit`]- and [`Prescription`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{patient, prescription, visit, Prescription, Visit},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns of a [`Prescription`] row.
const PRESCRIPTION_COLUMNS: &str = "\
    id, visit_id, patient_id, medicine_id, used_at, created_at";

/// Columns of a [`Visit`] row.
const VISIT_COLUMNS: &str = "\
    id, patient_id, reason, notes, patient_weight, patient_height, created_at";

/// Reads a [`Visit`] out of the provided [`Row`] with [`VISIT_COLUMNS`].
fn visit_from_row(row: &Row) -> Visit {
    Visit {
        id: row.get("id"),
        patient_id: row.get("patient_id"),
        reason: row.get("reason"),
        notes: row.get("notes"),
        patient_weight: row.get("patient_weight"),
        patient_height: row.get("patient_height"),
        created_at: row.get("created_at"),
    }
}

/// Reads a [`Prescription`] out of the provided [`Row`] with
/// [`PRESCRIPTION_COLUMNS`].
fn prescription_from_row(row: &Row) -> Prescription {
    Prescription {
        id: row.get("id"),
        visit_id: row.get("visit_id"),
        patient_id: row.get("patient_id"),
        medicine_id: row.get("medicine_id"),
        used_at: row.get("used_at"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Insert<Visit>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(visit): Insert<Visit>,
    ) -> Result<Self::Ok, Self::Err> {
        let Visit {
            id,
            patient_id,
            reason,
            notes,
            patient_weight,
            patient_height,
            created_at,
        } = visit;

        const SQL: &str = "\
            INSERT INTO visits (\
                id, patient_id, reason, notes, \
                patient_weight, patient_height, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::INT2, $4::TEXT, \
                $5::NUMERIC, $6::NUMERIC, \
                $7::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &patient_id,
                &reason,
                &notes,
                &patient_weight,
                &patient_height,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Visit>, patient::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Visit>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Visit>, patient::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let patient_id = by.into_inner();

        let sql = format!(
            "SELECT {VISIT_COLUMNS} FROM visits \
             WHERE patient_id = $1::UUID \
             ORDER BY created_at, id",
        );
        Ok(self
            .query(&sql, &[&patient_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(visit_from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Option<Visit>, patient::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Visit>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Visit>, patient::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let patient_id = by.into_inner();

        let sql = format!(
            "SELECT {VISIT_COLUMNS} FROM visits \
             WHERE patient_id = $1::UUID \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&patient_id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(visit_from_row))
    }
}

impl<C> Database<Insert<Vec<Prescription>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(prescriptions): Insert<Vec<Prescription>>,
    ) -> Result<Self::Ok, Self::Err> {
        if prescriptions.is_empty() {
            return Ok(());
        }

        let len = prescriptions.len();
        let (mut ids, mut visit_ids, mut patient_ids) =
            (Vec::with_capacity(len), Vec::with_capacity(len), Vec::with_capacity(len));
        let (mut medicine_ids, mut used_ats, mut created_ats) =
            (Vec::with_capacity(len), Vec::with_capacity(len), Vec::with_capacity(len));
        for p in prescriptions {
            ids.push(p.id);
            visit_ids.push(p.visit_id);
            patient_ids.push(p.patient_id);
            medicine_ids.push(p.medicine_id);
            used_ats.push(p.used_at);
            created_ats.push(p.created_at);
        }

        const SQL: &str = "\
            INSERT INTO prescriptions (\
                id, visit_id, patient_id, medicine_id, used_at, created_at\
            ) \
            SELECT * FROM UNNEST(\
                $1::UUID[], $2::UUID[], $3::UUID[], $4::UUID[], \
                $5::TIMESTAMPTZ[], $6::TIMESTAMPTZ[]\
            )";
        self.exec(
            SQL,
            &[
                &ids,
                &visit_ids,
                &patient_ids,
                &medicine_ids,
                &used_ats,
                &created_ats,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Prescription>, visit::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Prescription>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Prescription>, visit::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let visit_id = by.into_inner();

        let sql = format!(
            "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions \
             WHERE visit_id = $1::UUID \
             ORDER BY created_at, id",
        );
        Ok(self
            .query(&sql, &[&visit_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(prescription_from_row)
            .collect())
    }
}

impl<C>
    Database<
        Update<
            By<
                Option<Prescription>,
                (prescription::Id, visit::Id, prescription::UsageDateTime),
            >,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Prescription>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<
            By<
                Option<Prescription>,
                (prescription::Id, visit::Id, prescription::UsageDateTime),
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (id, visit_id, used_at) = by.into_inner();

        let sql = format!(
            "UPDATE prescriptions SET used_at = $3::TIMESTAMPTZ \
             WHERE id = $1::UUID \
               AND visit_id = $2::UUID \
             RETURNING {PRESCRIPTION_COLUMNS}",
        );
        Ok(self
            .query_opt(&sql, &[&id, &visit_id, &used_at])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(prescription_from_row))
    }
}
