//! Ledger entry domain types.

use chrono::{DateTime, Utc};
use remit_shared::types::{AccountId, EntryId};
use serde::{Deserialize, Serialize};

/// Direction of a ledger entry, derived from the sign of its amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Money left the account (negative amount).
    Debit,
    /// Money arrived in the account (positive amount).
    Credit,
}

/// An immutable ledger line recording one signed balance movement.
///
/// Every transfer writes exactly two entries whose amounts sum to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique identifier for this entry.
    pub id: EntryId,
    /// The account affected by this entry.
    pub account_id: AccountId,
    /// Signed amount: negative for debits, positive for credits.
    pub amount: i64,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// Returns whether this entry is a debit or a credit.
    #[must_use]
    pub const fn entry_type(&self) -> EntryType {
        if self.amount < 0 {
            EntryType::Debit
        } else {
            EntryType::Credit
        }
    }
}

/// Input for writing a ledger entry inside a transaction scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateEntryInput {
    /// Account the entry belongs to.
    pub account_id: AccountId,
    /// Signed amount.
    pub amount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(amount: i64) -> Entry {
        Entry {
            id: EntryId::new(),
            account_id: AccountId::new(),
            amount,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_entry_type_from_sign() {
        assert_eq!(entry(-30).entry_type(), EntryType::Debit);
        assert_eq!(entry(30).entry_type(), EntryType::Credit);
    }
}
