//! Transfer domain types.
//!
//! A transfer is represented by one immutable `Transfer` record plus a debit
//! and a credit `Entry`. Callers receive all of it, together with the updated
//! account snapshots, as a `TransferResult`.

use chrono::{DateTime, Utc};
use remit_shared::types::{AccountId, TransferId};
use serde::{Deserialize, Serialize};

use super::account::Account;
use super::entry::Entry;

/// Request to move `amount` from one account to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferParams {
    /// Account to debit.
    pub from_account_id: AccountId,
    /// Account to credit.
    pub to_account_id: AccountId,
    /// Amount in the smallest currency unit. Must be positive.
    pub amount: i64,
}

impl TransferParams {
    /// Creates transfer parameters.
    #[must_use]
    pub const fn new(from_account_id: AccountId, to_account_id: AccountId, amount: i64) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
        }
    }

    /// Returns true when source and destination are the same account.
    #[must_use]
    pub fn is_self_transfer(&self) -> bool {
        self.from_account_id == self.to_account_id
    }
}

/// Immutable record of a single transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Unique identifier for this transfer.
    pub id: TransferId,
    /// Account that was debited.
    pub from_account_id: AccountId,
    /// Account that was credited.
    pub to_account_id: AccountId,
    /// Transferred amount (always positive).
    pub amount: i64,
    /// When the transfer was recorded.
    pub created_at: DateTime<Utc>,
}

/// Input for recording a transfer inside a transaction scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateTransferInput {
    /// Account to debit.
    pub from_account_id: AccountId,
    /// Account to credit.
    pub to_account_id: AccountId,
    /// Positive amount.
    pub amount: i64,
}

impl From<TransferParams> for CreateTransferInput {
    fn from(params: TransferParams) -> Self {
        Self {
            from_account_id: params.from_account_id,
            to_account_id: params.to_account_id,
            amount: params.amount,
        }
    }
}

/// Everything a successful transfer produced. Not persisted itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    /// The transfer record.
    pub transfer: Transfer,
    /// Source account after the debit.
    pub from_account: Account,
    /// Destination account after the credit.
    pub to_account: Account,
    /// Debit entry on the source account.
    pub from_entry: Entry,
    /// Credit entry on the destination account.
    pub to_entry: Entry,
}

/// Progress of a single transfer invocation.
///
/// `Committed` and `RolledBack` are terminal. Intermediate stages are never
/// visible to other transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStage {
    /// Nothing written yet.
    Started,
    /// Inserting the transfer record.
    RecordingTransfer,
    /// Writing the debit entry and the source balance.
    DebitingSource,
    /// Writing the credit entry and the destination balance.
    CreditingDestination,
    /// The scope committed.
    Committed,
    /// The scope was rolled back.
    RolledBack,
}

impl TransferStage {
    /// Returns true for `Committed` and `RolledBack`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }
}

impl std::fmt::Display for TransferStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Started => "started",
            Self::RecordingTransfer => "recording_transfer",
            Self::DebitingSource => "debiting_source",
            Self::CreditingDestination => "crediting_destination",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        };
        f.write_str(name)
    }
}
