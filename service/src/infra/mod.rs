//! Infrastructure layer.

pub mod cache;
pub mod database;
pub mod token;

#[cfg(feature = "redis")]
pub use self::cache::Redis;
pub use self::{
    cache::{Cache, Sessions},
    database::{Database, Memory},
};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
