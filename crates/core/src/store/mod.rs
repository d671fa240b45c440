//! Storage port consumed by the executor and the transfer service.
//!
//! The storage engine provides atomic scopes, row-level locking and durability.
//! Everything in this crate talks to it through three traits:
//!
//! - [`LedgerStore`] opens scopes.
//! - [`TransactionScope`] commits or rolls back one scope.
//! - [`LedgerQueries`] is the set of reads and writes bound to one scope.
//!
//! Units of work only ever see `&dyn LedgerQueries`, so no step inside a unit
//! of work can open a second transaction.

pub mod memory;

use async_trait::async_trait;
use remit_shared::types::AccountId;

use crate::ledger::{
    Account, CreateEntryInput, CreateTransferInput, Entry, StoreError, Transfer,
};

pub use memory::{Fault, MemoryStore};

/// Reads and writes bound to a single transaction scope.
#[async_trait]
pub trait LedgerQueries: Send + Sync {
    /// Inserts a transfer record.
    async fn create_transfer(&self, input: &CreateTransferInput) -> Result<Transfer, StoreError>;

    /// Inserts a ledger entry.
    async fn create_entry(&self, input: &CreateEntryInput) -> Result<Entry, StoreError>;

    /// Reads an account and locks its row until the scope ends.
    ///
    /// Blocks while another scope holds the lock.
    async fn get_account_for_update(&self, id: AccountId) -> Result<Account, StoreError>;

    /// Overwrites an account balance and returns the updated row.
    async fn update_account_balance(
        &self,
        id: AccountId,
        balance: i64,
    ) -> Result<Account, StoreError>;
}

/// An open transaction scope.
#[async_trait]
pub trait TransactionScope: LedgerQueries + Sized {
    /// Makes every write of the scope durable and visible.
    async fn commit(self) -> Result<(), StoreError>;

    /// Discards every write of the scope.
    async fn rollback(self) -> Result<(), StoreError>;
}

/// A storage engine able to open transaction scopes.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Scope type produced by [`LedgerStore::begin`].
    type Scope: TransactionScope + 'static;

    /// Opens a new transaction scope.
    async fn begin(&self) -> Result<Self::Scope, StoreError>;
}
