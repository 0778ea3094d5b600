//! [Redis] [`Cache`] backend.
//!
//! [Redis]: https://redis.io

use common::operations::{By, Delete, Insert, Select};
use deadpool_redis::redis::{self, AsyncCommands as _};
use derive_more::{Display, Error as StdError, From};
use tracerr::Traced;

use super::{Cache, Entry, Key};

pub use deadpool_redis::{Config, Pool, PoolConfig, Runtime};

/// [Redis] [`Cache`] backend.
///
/// [Redis]: https://redis.io
#[derive(Clone, Debug)]
pub struct Redis {
    /// Pool of [Redis] connections.
    ///
    /// [Redis]: https://redis.io
    pool: Pool,
}

impl Redis {
    /// Creates a new [`Redis`] backend connected according to the provided
    /// [`Config`].
    ///
    /// # Errors
    ///
    /// If the connection pool cannot be created.
    pub fn new(config: &Config) -> Result<Self, Traced<super::Error>> {
        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(Error::from)
            .map_err(tracerr::from_and_wrap!(=> super::Error))?;
        Ok(Self { pool })
    }

    /// Gets a connection from the [`Pool`].
    async fn conn(
        &self,
    ) -> Result<deadpool_redis::Connection, Traced<super::Error>> {
        self.pool
            .get()
            .await
            .map_err(Error::from)
            .map_err(tracerr::from_and_wrap!(=> super::Error))
    }
}

impl Cache<Select<By<Option<String>, Key>>> for Redis {
    type Ok = Option<String>;
    type Err = Traced<super::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<String>, Key>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut conn = self.conn().await.map_err(tracerr::wrap!())?;
        conn.get::<_, Option<String>>(&by.as_inner().0)
            .await
            .map_err(Error::from)
            .map_err(tracerr::from_and_wrap!(=> super::Error))
    }
}

impl Cache<Insert<Entry>> for Redis {
    type Ok = ();
    type Err = Traced<super::Error>;

    async fn execute(
        &self,
        Insert(entry): Insert<Entry>,
    ) -> Result<Self::Ok, Self::Err> {
        let Entry { key, value, ttl } = entry;

        let mut conn = self.conn().await.map_err(tracerr::wrap!())?;
        conn.set_ex::<_, _, ()>(&key.0, value, ttl.as_secs().max(1))
            .await
            .map_err(Error::from)
            .map_err(tracerr::from_and_wrap!(=> super::Error))
    }
}

impl Cache<Delete<Key>> for Redis {
    type Ok = ();
    type Err = Traced<super::Error>;

    async fn execute(
        &self,
        Delete(key): Delete<Key>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut conn = self.conn().await.map_err(tracerr::wrap!())?;
        conn.del::<_, ()>(&key.0)
            .await
            .map_err(Error::from)
            .map_err(tracerr::from_and_wrap!(=> super::Error))
    }
}

/// [`Redis`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Failed to create a connection pool.
    #[display("failed to create Redis pool: {_0}")]
    CreatePool(deadpool_redis::CreatePoolError),

    /// Failed to get a connection from the pool.
    #[display("failed to get Redis connection: {_0}")]
    Pool(deadpool_redis::PoolError),

    /// Command failed.
    #[display("Redis command failed: {_0}")]
    Command(redis::RedisError),
}
