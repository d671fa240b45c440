//! Business rules applied around a transfer.

use remit_shared::types::AccountId;

use super::account::Account;
use super::error::LedgerError;

/// Rejects zero and negative transfer amounts.
///
/// # Errors
///
/// Returns `LedgerError::InvalidAmount` if `amount <= 0`.
pub fn validate_amount(amount: i64) -> Result<(), LedgerError> {
    if amount <= 0 {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}

/// Returns the order in which two accounts must be locked.
///
/// The lower ID always comes first, so two transfers moving money in
/// opposite directions between the same pair never wait on each other in a
/// cycle. A self-transfer yields a single account.
#[must_use]
pub fn lock_order(a: AccountId, b: AccountId) -> (AccountId, Option<AccountId>) {
    match a.cmp(&b) {
        std::cmp::Ordering::Less => (a, Some(b)),
        std::cmp::Ordering::Greater => (b, Some(a)),
        std::cmp::Ordering::Equal => (a, None),
    }
}

/// Computes `account.balance + delta` without overflowing.
///
/// # Errors
///
/// Returns `LedgerError::BalanceOverflow` if the result does not fit in `i64`.
pub fn apply_delta(account: &Account, delta: i64) -> Result<i64, LedgerError> {
    account
        .balance
        .checked_add(delta)
        .ok_or(LedgerError::BalanceOverflow {
            account_id: account.id,
        })
}
