//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Transfers never go through them; they run inside a
//! [`PgLedgerStore`](crate::store::PgLedgerStore) scope.

pub mod account;
pub mod entry;
pub mod error;
pub mod transfer;

pub use account::{AccountFilter, AccountRepository, CreateAccountInput};
pub use entry::EntryRepository;
pub use error::RepositoryError;
pub use transfer::{TransferFilter, TransferRepository};
