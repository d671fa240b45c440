//! Postgres storage engine for the transfer core.
//!
//! Each scope is one database transaction opened at the configured isolation
//! level. Account rows are locked with `SELECT ... FOR NO KEY UPDATE`: it
//! blocks concurrent balance writers but not the `KEY SHARE` locks taken by
//! foreign key checks when entries and transfers reference the same account.

use std::borrow::Cow;

use async_trait::async_trait;
use chrono::Utc;
use remit_core::ledger::{
    Account, CreateEntryInput, CreateTransferInput, Entry, StoreError, Transfer,
};
use remit_core::store::{LedgerQueries, LedgerStore, TransactionScope};
use remit_shared::config::{DatabaseConfig, IsolationLevel};
use remit_shared::types::{AccountId, EntryId, TransferId};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QuerySelect,
    RuntimeErr, Set, TransactionTrait,
};
use tracing::{debug, trace};

use crate::entities::{accounts, entries, transfers};

/// SQLSTATE `serialization_failure`.
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";
/// SQLSTATE class 23, integrity constraint violations.
const INTEGRITY_CONSTRAINT_CLASS: &str = "23";

/// Ledger store backed by a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    db: DatabaseConnection,
    isolation: IsolationLevel,
}

impl PgLedgerStore {
    /// Creates a store opening scopes at `READ COMMITTED`.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            isolation: IsolationLevel::ReadCommitted,
        }
    }

    /// Creates a store using the isolation level from configuration.
    #[must_use]
    pub fn from_config(db: DatabaseConnection, config: &DatabaseConfig) -> Self {
        Self::new(db).with_isolation(config.isolation_level)
    }

    /// Sets the isolation level of every scope opened afterwards.
    #[must_use]
    pub fn with_isolation(mut self, isolation: IsolationLevel) -> Self {
        self.isolation = isolation;
        self
    }

    /// Returns the underlying connection pool.
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    type Scope = PgScope;

    async fn begin(&self) -> Result<PgScope, StoreError> {
        let txn = self
            .db
            .begin_with_config(Some(isolation_level(self.isolation)), None)
            .await
            .map_err(store_error)?;
        debug!(isolation = ?self.isolation, "database transaction started");
        Ok(PgScope { txn })
    }
}

/// One open Postgres transaction.
///
/// Dropping the scope without committing rolls the transaction back.
pub struct PgScope {
    txn: DatabaseTransaction,
}

impl std::fmt::Debug for PgScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgScope").finish_non_exhaustive()
    }
}

#[async_trait]
impl LedgerQueries for PgScope {
    async fn create_transfer(&self, input: &CreateTransferInput) -> Result<Transfer, StoreError> {
        let model = transfers::ActiveModel {
            id: Set(TransferId::new().into_inner()),
            from_account_id: Set(input.from_account_id.into_inner()),
            to_account_id: Set(input.to_account_id.into_inner()),
            amount: Set(input.amount),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.txn)
        .await
        .map_err(store_error)?;

        trace!(transfer_id = %model.id, "transfer row inserted");
        Ok(model.into())
    }

    async fn create_entry(&self, input: &CreateEntryInput) -> Result<Entry, StoreError> {
        let model = entries::ActiveModel {
            id: Set(EntryId::new().into_inner()),
            account_id: Set(input.account_id.into_inner()),
            amount: Set(input.amount),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.txn)
        .await
        .map_err(store_error)?;

        trace!(entry_id = %model.id, account_id = %model.account_id, "entry row inserted");
        Ok(model.into())
    }

    async fn get_account_for_update(&self, id: AccountId) -> Result<Account, StoreError> {
        let model = accounts::Entity::find_by_id(id.into_inner())
            .lock(LockType::NoKeyUpdate)
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .ok_or(StoreError::AccountNotFound(id))?;

        trace!(account_id = %id, "account row locked");
        to_account(model)
    }

    async fn update_account_balance(
        &self,
        id: AccountId,
        balance: i64,
    ) -> Result<Account, StoreError> {
        let update = accounts::ActiveModel {
            id: Set(id.into_inner()),
            balance: Set(balance),
            ..Default::default()
        };

        match update.update(&self.txn).await {
            Ok(model) => to_account(model),
            Err(DbErr::RecordNotUpdated) => Err(StoreError::AccountNotFound(id)),
            Err(err) => Err(store_error(err)),
        }
    }
}

#[async_trait]
impl TransactionScope for PgScope {
    async fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().await.map_err(store_error)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.txn.rollback().await.map_err(store_error)
    }
}

const fn isolation_level(level: IsolationLevel) -> sea_orm::IsolationLevel {
    match level {
        IsolationLevel::ReadCommitted => sea_orm::IsolationLevel::ReadCommitted,
        IsolationLevel::RepeatableRead => sea_orm::IsolationLevel::RepeatableRead,
        IsolationLevel::Serializable => sea_orm::IsolationLevel::Serializable,
    }
}

fn to_account(model: accounts::Model) -> Result<Account, StoreError> {
    Account::try_from(model).map_err(|e| StoreError::Database(e.to_string()))
}

/// Returns the SQLSTATE code of a database-side error, if any.
fn sqlstate(err: &DbErr) -> Option<Cow<'_, str>> {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db_err))) => db_err.code(),
        _ => None,
    }
}

/// Classifies a `SeaORM` error into the storage port's error type.
fn store_error(err: DbErr) -> StoreError {
    match sqlstate(&err).as_deref() {
        Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => {
            StoreError::SerializationFailure(err.to_string())
        }
        Some(code) if code.starts_with(INTEGRITY_CONSTRAINT_CLASS) => {
            StoreError::Constraint(err.to_string())
        }
        _ => StoreError::Database(err.to_string()),
    }
}
