//! [`Tx`] client definitions.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

use super::NonTx;

/// Transactional Postgres database client.
///
/// Clones share the same transaction. Dropping the last clone without
/// committing rolls the transaction back.
#[derive(Clone, Debug)]
pub struct Tx {
    /// Started transaction, [`None`] once committed.
    inner: Arc<RwLock<Option<connection::Tx>>>,
}

impl Tx {
    /// Starts a new [`Tx`] in a connection taken by the provided [`NonTx`]
    /// client.
    ///
    /// # Errors
    ///
    /// If no connection can be taken, or the transaction cannot be started.
    pub async fn begin(client: &NonTx) -> Result<Self, Traced<database::Error>> {
        let conn = client.connection().await.map_err(tracerr::wrap!())?;
        let tx = connection::Tx::begin(conn)
            .await
            .map_err(tracerr::wrap!())?;
        Ok(Self {
            inner: Arc::new(RwLock::new(Some(tx))),
        })
    }

    /// Returns the underlying [`connection::Tx`] of this [`Tx`] client.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        RwLockReadGuard::try_map(self.inner.read().await, Option::as_ref)
            .map_err(|_| tracerr::new!(postgres::Error::Committed))
            .map_err(tracerr::map_from)
    }

    /// Commits this [`Tx`] client.
    ///
    /// # Errors
    ///
    /// If the transaction fails to commit, or is already committed.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let tx = self
            .inner
            .write()
            .await
            .take()
            .ok_or_else(|| tracerr::new!(postgres::Error::Committed))
            .map_err(tracerr::map_from)?;
        tx.commit().await.map_err(tracerr::wrap!())
    }
}

impl Connection for Tx {
    async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>> {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .query(sql, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>> {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .query_opt(sql, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>> {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .exec(sql, params)
            .await
            .map_err(tracerr::wrap!())
    }
}
