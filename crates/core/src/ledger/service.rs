//! Transfer orchestration.
//!
//! A transfer runs as one unit of work inside one transaction scope:
//!
//! 1. record the transfer
//! 2. lock both accounts, lower ID first
//! 3. write the debit entry and the new source balance
//! 4. write the credit entry and the new destination balance
//!
//! Balances are computed only from rows read under lock inside the scope, so
//! concurrent transfers over the same accounts serialize on the row locks and
//! never lose an update.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::account::Account;
use super::entry::CreateEntryInput;
use super::error::LedgerError;
use super::types::{TransferParams, TransferResult, TransferStage};
use super::validation::{apply_delta, lock_order, validate_amount};
use crate::executor::{TxExecutor, UnitOfWork};
use crate::store::{LedgerQueries, LedgerStore};

/// The transfer algorithm as a unit of work.
///
/// Tracks how far it got so a failed transfer can report the stage it was
/// rolled back from.
#[derive(Debug, Clone)]
pub struct TransferWork {
    params: TransferParams,
    stage: TransferStage,
}

impl TransferWork {
    /// Creates the unit of work for `params`.
    #[must_use]
    pub const fn new(params: TransferParams) -> Self {
        Self {
            params,
            stage: TransferStage::Started,
        }
    }

    /// Returns the last stage reached.
    #[must_use]
    pub const fn stage(&self) -> TransferStage {
        self.stage
    }

    /// Locks the accounts of this transfer in ascending ID order.
    ///
    /// Returns `(source, destination)`; they are the same row for a
    /// self-transfer.
    async fn lock_accounts(
        &self,
        queries: &dyn LedgerQueries,
    ) -> Result<(Account, Account), LedgerError> {
        let TransferParams {
            from_account_id,
            to_account_id,
            ..
        } = self.params;

        let (first, second) = lock_order(from_account_id, to_account_id);
        let first_account = queries.get_account_for_update(first).await?;
        let Some(second) = second else {
            return Ok((first_account.clone(), first_account));
        };
        let second_account = queries.get_account_for_update(second).await?;

        if first == from_account_id {
            Ok((first_account, second_account))
        } else {
            Ok((second_account, first_account))
        }
    }
}

#[async_trait]
impl UnitOfWork for TransferWork {
    type Output = TransferResult;

    async fn apply(&mut self, queries: &dyn LedgerQueries) -> Result<TransferResult, LedgerError> {
        let TransferParams {
            from_account_id,
            to_account_id,
            amount,
        } = self.params;

        self.stage = TransferStage::RecordingTransfer;
        let transfer = queries.create_transfer(&self.params.into()).await?;

        self.stage = TransferStage::DebitingSource;
        let (source, destination) = self.lock_accounts(queries).await?;
        let from_entry = queries
            .create_entry(&CreateEntryInput {
                account_id: from_account_id,
                amount: -amount,
            })
            .await?;
        let from_account = queries
            .update_account_balance(from_account_id, apply_delta(&source, -amount)?)
            .await?;

        self.stage = TransferStage::CreditingDestination;
        let to_entry = queries
            .create_entry(&CreateEntryInput {
                account_id: to_account_id,
                amount,
            })
            .await?;
        // A self-transfer credits the row it just debited.
        let credited = if self.params.is_self_transfer() {
            &from_account
        } else {
            &destination
        };
        let to_account = queries
            .update_account_balance(to_account_id, apply_delta(credited, amount)?)
            .await?;
        let from_account = if self.params.is_self_transfer() {
            to_account.clone()
        } else {
            from_account
        };

        Ok(TransferResult {
            transfer,
            from_account,
            to_account,
            from_entry,
            to_entry,
        })
    }
}

/// Moves balances between accounts atomically.
#[derive(Debug, Clone)]
pub struct TransferService<S> {
    executor: TxExecutor<S>,
}

impl<S: LedgerStore> TransferService<S> {
    /// Creates a transfer service on top of an executor.
    #[must_use]
    pub const fn new(executor: TxExecutor<S>) -> Self {
        Self { executor }
    }

    /// Returns the underlying executor.
    pub const fn executor(&self) -> &TxExecutor<S> {
        &self.executor
    }

    /// Transfers `params.amount` from one account to another.
    ///
    /// Self-transfers are allowed: they write a debit and a credit entry on
    /// the same account and leave its balance unchanged.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the amount is not positive; storage is not touched.
    /// - Any step, commit or rollback failure from the executor. A failed
    ///   transfer leaves no transfer, entry or balance change behind.
    pub async fn transfer(&self, params: TransferParams) -> Result<TransferResult, LedgerError> {
        self.run(params, None).await
    }

    /// Like [`transfer`](Self::transfer), but rolls back as soon as `cancel` fires.
    pub async fn transfer_with_cancel(
        &self,
        params: TransferParams,
        cancel: &CancellationToken,
    ) -> Result<TransferResult, LedgerError> {
        self.run(params, Some(cancel)).await
    }

    #[instrument(
        name = "transfer",
        skip_all,
        fields(
            from = %params.from_account_id,
            to = %params.to_account_id,
            amount = params.amount,
        )
    )]
    async fn run(
        &self,
        params: TransferParams,
        cancel: Option<&CancellationToken>,
    ) -> Result<TransferResult, LedgerError> {
        validate_amount(params.amount)?;

        let mut work = TransferWork::new(params);
        let outcome = match cancel {
            Some(token) => self.executor.execute_with_cancel(&mut work, token).await,
            None => self.executor.execute(&mut work).await,
        };

        match &outcome {
            Ok(result) => {
                info!(
                    transfer_id = %result.transfer.id,
                    stage = %TransferStage::Committed,
                    "transfer committed"
                );
            }
            Err(error) => {
                warn!(
                    failed_at = %work.stage(),
                    stage = %TransferStage::RolledBack,
                    %error,
                    "transfer failed"
                );
            }
        }
        outcome
    }
}
