//! [`Command`] for logging out of an [`Account`].

use common::operations::{By, Delete};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::account::Session;
use crate::{
    domain::{account::session, Account},
    infra::{cache, Cache, Sessions},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Session`] from the [`Sessions`] cache.
///
/// Deleting an already deleted or expired [`Session`] succeeds.
#[derive(Clone, Debug, From)]
pub struct DeleteAccountSession {
    /// [`Session`] token to delete.
    pub token: session::Token,
}

impl<Db, C> Command<DeleteAccountSession> for Service<Db, C>
where
    Sessions<C>: for<'t> Cache<
        Delete<By<Account, &'t session::Token>>,
        Ok = (),
        Err = Traced<cache::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteAccountSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteAccountSession { token } = cmd;

        self.sessions()
            .execute(Delete(By::new(&token)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!("session logged out");

        Ok(())
    }
}

/// Error of [`DeleteAccountSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Cache`] error.
    #[display("`Cache` operation failed: {_0}")]
    Cache(cache::Error),
}
