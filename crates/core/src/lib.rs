//! Core transfer logic for Remit.
//!
//! This crate holds the domain types, the transaction executor and the
//! transfer orchestrator. It talks to storage only through the traits in
//! [`store`], so the same logic runs against PostgreSQL or the in-memory
//! engine.
//!
//! # Modules
//!
//! - `ledger` - Accounts, transfers, entries and the transfer service
//! - `store` - Storage port and the in-memory engine
//! - `executor` - Begin / work / commit-or-rollback

pub mod executor;
pub mod ledger;
pub mod store;

pub use executor::{TxExecutor, UnitOfWork};
pub use ledger::{LedgerError, TransferParams, TransferResult, TransferService};
pub use store::{LedgerQueries, LedgerStore, MemoryStore, TransactionScope};
