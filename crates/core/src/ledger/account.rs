//! Account domain type.

use chrono::{DateTime, Utc};
use remit_shared::types::{AccountId, CurrencyCode};
use serde::{Deserialize, Serialize};

/// A balance-holding account.
///
/// Accounts are created outside of transfers. Their balance only ever changes
/// inside a transaction scope that also writes the matching ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier for this account.
    pub id: AccountId,
    /// Name of the account holder.
    pub owner: String,
    /// Current balance in the smallest currency unit.
    pub balance: i64,
    /// Currency the balance is denominated in.
    pub currency: CurrencyCode,
    /// When the account was opened.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Returns a copy of this account carrying a new balance.
    #[must_use]
    pub fn with_balance(&self, balance: i64) -> Self {
        Self {
            balance,
            ..self.clone()
        }
    }
}
