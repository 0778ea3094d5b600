//! [`Handler`] abstractions.
//!
//! Every layer of the system (commands, queries, databases, caches) is
//! expressed as a [`Handler`] of some typed operation, so that the business
//! logic states its infrastructure requirements as trait bounds:
//!
//! ```rust
//! # use common::{operations::{By, Select}, Handler};
//! async fn lookup<Db>(db: &Db, id: u64) -> Result<Option<String>, Db::Err>
//! where
//!     Db: Handler<Select<By<Option<String>, u64>>, Ok = Option<String>>,
//! {
//!     db.execute(Select(By::new(id))).await
//! }
//! ```

use std::future::Future;

/// Executable handler of `Args`.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
