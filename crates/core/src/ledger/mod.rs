//! Money transfer ledger.
//!
//! This module implements the ledger domain:
//! - Accounts, transfers and ledger entries
//! - Amount validation and lock ordering
//! - Error taxonomy for transactional work
//! - The transfer service

pub mod account;
pub mod entry;
pub mod error;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;

pub use account::Account;
pub use entry::{CreateEntryInput, Entry, EntryType};
pub use error::{ErrorKind, LedgerError, StoreError};
pub use service::{TransferService, TransferWork};
pub use types::{CreateTransferInput, Transfer, TransferParams, TransferResult, TransferStage};
pub use validation::{apply_delta, lock_order, validate_amount};
