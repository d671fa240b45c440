//! Transaction executor: runs a unit of work inside one atomic scope.
//!
//! The executor opens a scope, hands the unit of work a handle whose every
//! read and write is bound to that scope, then commits on success or rolls
//! back on failure. A failed rollback never hides the failure that caused it.
//!
//! Cancellation and deadlines are treated exactly like a failing step: the
//! unit of work is dropped and the scope is rolled back. Both bound the unit
//! of work only. A commit that has started always runs to completion, since
//! abandoning it would leave the outcome unknown.
//!
//! The executor never retries. Callers that want to retry serialization
//! failures check [`LedgerError::is_retryable`].

use std::time::Duration;

use async_trait::async_trait;
use remit_shared::config::LedgerConfig;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::ledger::LedgerError;
use crate::store::{LedgerQueries, LedgerStore, TransactionScope};

/// A unit of work applied within a single transaction scope.
///
/// All steps of the work share the scope passed to `apply`; there is no way
/// to open a nested transaction from inside it.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Value produced when the work succeeds.
    type Output: Send;

    /// Runs the work against the scope.
    async fn apply(&mut self, queries: &dyn LedgerQueries) -> Result<Self::Output, LedgerError>;
}

#[async_trait]
impl<W: UnitOfWork + ?Sized> UnitOfWork for &mut W {
    type Output = W::Output;

    async fn apply(&mut self, queries: &dyn LedgerQueries) -> Result<Self::Output, LedgerError> {
        (**self).apply(queries).await
    }
}

/// Executes units of work atomically against a storage engine.
#[derive(Debug, Clone)]
pub struct TxExecutor<S> {
    store: S,
    timeout: Option<Duration>,
}

impl<S: LedgerStore> TxExecutor<S> {
    /// Creates an executor without a scope deadline.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self {
            store,
            timeout: None,
        }
    }

    /// Creates an executor using the scope deadline from configuration.
    #[must_use]
    pub fn from_config(store: S, config: &LedgerConfig) -> Self {
        Self::new(store).with_timeout(config.transaction_timeout())
    }

    /// Bounds the unit of work of every scope to `timeout`. `None` removes
    /// the bound. The commit is not covered.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the storage engine.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the configured scope deadline.
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Runs `work` inside a new transaction scope.
    ///
    /// # Errors
    ///
    /// - `BeginFailed` if no scope could be opened; `work` does not run.
    /// - The error returned by `work`, after a successful rollback.
    /// - `RollbackFailed` carrying both errors if the rollback failed too.
    /// - `CommitFailed` if `work` succeeded but the commit did not.
    pub async fn execute<W: UnitOfWork>(&self, work: W) -> Result<W::Output, LedgerError> {
        self.run(work, None).await
    }

    /// Like [`execute`](Self::execute), but rolls back with `Cancelled` as soon
    /// as `cancel` fires.
    pub async fn execute_with_cancel<W: UnitOfWork>(
        &self,
        work: W,
        cancel: &CancellationToken,
    ) -> Result<W::Output, LedgerError> {
        self.run(work, Some(cancel)).await
    }

    async fn run<W: UnitOfWork>(
        &self,
        mut work: W,
        cancel: Option<&CancellationToken>,
    ) -> Result<W::Output, LedgerError> {
        let scope = self.store.begin().await.map_err(LedgerError::BeginFailed)?;
        debug!("transaction scope opened");

        match self.drive(&mut work, &scope, cancel).await {
            Ok(output) => {
                scope.commit().await.map_err(LedgerError::CommitFailed)?;
                debug!("transaction scope committed");
                Ok(output)
            }
            Err(error) => match scope.rollback().await {
                Ok(()) => {
                    debug!(%error, "transaction scope rolled back");
                    Err(error)
                }
                Err(rollback) => {
                    warn!(%error, %rollback, "rollback failed after step failure");
                    Err(LedgerError::RollbackFailed {
                        error: Box::new(error),
                        rollback,
                    })
                }
            },
        }
    }

    async fn drive<W: UnitOfWork>(
        &self,
        work: &mut W,
        scope: &S::Scope,
        cancel: Option<&CancellationToken>,
    ) -> Result<W::Output, LedgerError> {
        let applied = work.apply(scope);
        let bounded = async {
            match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, applied).await {
                    Ok(result) => result,
                    Err(_) => Err(LedgerError::TimedOut(limit)),
                },
                None => applied.await,
            }
        };

        match cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => Err(LedgerError::Cancelled),
                result = bounded => result,
            },
            None => bounded.await,
        }
    }
}
