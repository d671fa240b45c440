//! In-memory storage engine.
//!
//! Behaves like a relational engine running at read-committed isolation with
//! explicit row locks:
//!
//! - writes are buffered per scope and applied atomically on commit
//! - `get_account_for_update` and `update_account_balance` take an exclusive
//!   row lock held until the scope ends
//! - inserts referencing unknown accounts fail like a foreign key would
//!
//! Faults can be armed with [`MemoryStore::inject`] to make a single
//! operation fail, which is how rollback paths are exercised in tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use remit_shared::types::{AccountId, CurrencyCode, EntryId, TransferId};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::trace;

use super::{LedgerQueries, LedgerStore, TransactionScope};
use crate::ledger::{
    Account, CreateEntryInput, CreateTransferInput, Entry, StoreError, Transfer,
};

/// A storage operation that can be made to fail once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Opening a scope.
    Begin,
    /// Inserting a transfer record.
    CreateTransfer,
    /// Inserting a ledger entry.
    CreateEntry,
    /// Locking and reading the given account.
    GetAccount(AccountId),
    /// Writing the balance of the given account.
    UpdateBalance(AccountId),
    /// Committing a scope.
    Commit,
    /// Rolling back a scope.
    Rollback,
}

#[derive(Debug, Default)]
struct LedgerState {
    accounts: HashMap<AccountId, Account>,
    transfers: Vec<Transfer>,
    entries: Vec<Entry>,
}

#[derive(Debug, Default)]
struct Inner {
    state: RwLock<LedgerState>,
    row_locks: DashMap<AccountId, Arc<Mutex<()>>>,
    faults: Mutex<Vec<Fault>>,
}

impl Inner {
    /// Fails with an injected error if `fault` is armed, disarming it.
    async fn trip(&self, fault: Fault) -> Result<(), StoreError> {
        let mut faults = self.faults.lock().await;
        if let Some(pos) = faults.iter().position(|armed| *armed == fault) {
            faults.remove(pos);
            trace!(?fault, "injected fault tripped");
            return Err(StoreError::Database(format!("injected fault: {fault:?}")));
        }
        Ok(())
    }

    async fn lock_row(&self, pending: &mut Pending, id: AccountId) {
        if pending.locks.contains_key(&id) {
            return;
        }
        let row = Arc::clone(self.row_locks.entry(id).or_default().value());
        let guard = row.lock_owned().await;
        pending.locks.insert(id, guard);
    }

    async fn committed_account(&self, id: AccountId) -> Result<Account, StoreError> {
        self.state
            .read()
            .await
            .accounts
            .get(&id)
            .cloned()
            .ok_or(StoreError::AccountNotFound(id))
    }

    async fn ensure_account_exists(&self, id: AccountId) -> Result<(), StoreError> {
        if self.state.read().await.accounts.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::Constraint(format!(
                "foreign key violation: account {id} does not exist"
            )))
        }
    }
}

/// In-memory storage engine. Cloning yields another handle to the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new account with the given starting balance.
    pub async fn create_account(
        &self,
        owner: impl Into<String>,
        balance: i64,
        currency: CurrencyCode,
    ) -> Account {
        let account = Account {
            id: AccountId::new(),
            owner: owner.into(),
            balance,
            currency,
            created_at: Utc::now(),
        };
        self.insert_account(account.clone()).await;
        account
    }

    /// Inserts or replaces an account row as-is.
    pub async fn insert_account(&self, account: Account) {
        self.inner
            .state
            .write()
            .await
            .accounts
            .insert(account.id, account);
    }

    /// Returns the committed state of an account.
    pub async fn account(&self, id: AccountId) -> Option<Account> {
        self.inner.state.read().await.accounts.get(&id).cloned()
    }

    /// Returns every committed account, ordered by ID.
    pub async fn accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .inner
            .state
            .read()
            .await
            .accounts
            .values()
            .cloned()
            .collect();
        accounts.sort_by_key(|account| account.id);
        accounts
    }

    /// Returns every committed transfer in commit order.
    pub async fn transfers(&self) -> Vec<Transfer> {
        self.inner.state.read().await.transfers.clone()
    }

    /// Returns every committed entry in commit order.
    pub async fn entries(&self) -> Vec<Entry> {
        self.inner.state.read().await.entries.clone()
    }

    /// Returns the committed entries of one account.
    pub async fn entries_for(&self, account_id: AccountId) -> Vec<Entry> {
        self.inner
            .state
            .read()
            .await
            .entries
            .iter()
            .filter(|entry| entry.account_id == account_id)
            .cloned()
            .collect()
    }

    /// Sum of all committed balances.
    pub async fn total_balance(&self) -> i128 {
        self.inner
            .state
            .read()
            .await
            .accounts
            .values()
            .map(|account| i128::from(account.balance))
            .sum()
    }

    /// Arms a one-shot fault: the next matching operation fails.
    pub async fn inject(&self, fault: Fault) {
        self.inner.faults.lock().await.push(fault);
    }
}

#[derive(Default)]
struct Pending {
    locks: HashMap<AccountId, OwnedMutexGuard<()>>,
    balances: HashMap<AccountId, i64>,
    transfers: Vec<Transfer>,
    entries: Vec<Entry>,
}

/// A transaction scope over a [`MemoryStore`].
///
/// Dropping the scope without committing discards its writes and releases
/// its row locks.
pub struct MemoryScope {
    store: Arc<Inner>,
    pending: Mutex<Pending>,
}

#[async_trait]
impl LedgerStore for MemoryStore {
    type Scope = MemoryScope;

    async fn begin(&self) -> Result<MemoryScope, StoreError> {
        self.inner.trip(Fault::Begin).await?;
        Ok(MemoryScope {
            store: Arc::clone(&self.inner),
            pending: Mutex::new(Pending::default()),
        })
    }
}

#[async_trait]
impl LedgerQueries for MemoryScope {
    async fn create_transfer(&self, input: &CreateTransferInput) -> Result<Transfer, StoreError> {
        self.store.trip(Fault::CreateTransfer).await?;
        if input.amount <= 0 {
            return Err(StoreError::Constraint(format!(
                "check violation: transfer amount {} must be positive",
                input.amount
            )));
        }
        self.store.ensure_account_exists(input.from_account_id).await?;
        self.store.ensure_account_exists(input.to_account_id).await?;

        let transfer = Transfer {
            id: TransferId::new(),
            from_account_id: input.from_account_id,
            to_account_id: input.to_account_id,
            amount: input.amount,
            created_at: Utc::now(),
        };
        self.pending.lock().await.transfers.push(transfer.clone());
        Ok(transfer)
    }

    async fn create_entry(&self, input: &CreateEntryInput) -> Result<Entry, StoreError> {
        self.store.trip(Fault::CreateEntry).await?;
        self.store.ensure_account_exists(input.account_id).await?;

        let entry = Entry {
            id: EntryId::new(),
            account_id: input.account_id,
            amount: input.amount,
            created_at: Utc::now(),
        };
        self.pending.lock().await.entries.push(entry.clone());
        Ok(entry)
    }

    async fn get_account_for_update(&self, id: AccountId) -> Result<Account, StoreError> {
        self.store.trip(Fault::GetAccount(id)).await?;
        let mut pending = self.pending.lock().await;
        self.store.lock_row(&mut pending, id).await;

        let committed = self.store.committed_account(id).await?;
        Ok(match pending.balances.get(&id) {
            Some(&balance) => committed.with_balance(balance),
            None => committed,
        })
    }

    async fn update_account_balance(
        &self,
        id: AccountId,
        balance: i64,
    ) -> Result<Account, StoreError> {
        self.store.trip(Fault::UpdateBalance(id)).await?;
        let mut pending = self.pending.lock().await;
        self.store.lock_row(&mut pending, id).await;

        let committed = self.store.committed_account(id).await?;
        pending.balances.insert(id, balance);
        Ok(committed.with_balance(balance))
    }
}

#[async_trait]
impl TransactionScope for MemoryScope {
    async fn commit(self) -> Result<(), StoreError> {
        self.store.trip(Fault::Commit).await?;
        let pending = self.pending.into_inner();

        let mut state = self.store.state.write().await;
        for (id, balance) in &pending.balances {
            if let Some(account) = state.accounts.get_mut(id) {
                account.balance = *balance;
            }
        }
        state.transfers.extend(pending.transfers);
        state.entries.extend(pending.entries);
        drop(state);

        // Row locks are released only after the writes are visible.
        drop(pending.locks);
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.store.trip(Fault::Rollback).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn usd() -> CurrencyCode {
        "USD".parse().unwrap()
    }

    #[tokio::test]
    async fn test_commit_applies_all_writes() {
        let store = MemoryStore::new();
        let a = store.create_account("alice", 100, usd()).await;
        let b = store.create_account("bob", 50, usd()).await;

        let scope = store.begin().await.unwrap();
        scope
            .create_transfer(&CreateTransferInput {
                from_account_id: a.id,
                to_account_id: b.id,
                amount: 10,
            })
            .await
            .unwrap();
        scope
            .create_entry(&CreateEntryInput {
                account_id: a.id,
                amount: -10,
            })
            .await
            .unwrap();
        let updated = scope.update_account_balance(a.id, 90).await.unwrap();
        assert_eq!(updated.balance, 90);

        // Not visible before commit.
        assert_eq!(store.account(a.id).await.unwrap().balance, 100);
        assert!(store.transfers().await.is_empty());

        scope.commit().await.unwrap();
        assert_eq!(store.account(a.id).await.unwrap().balance, 90);
        assert_eq!(store.transfers().await.len(), 1);
        assert_eq!(store.entries_for(a.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let store = MemoryStore::new();
        let a = store.create_account("alice", 100, usd()).await;

        let scope = store.begin().await.unwrap();
        scope.update_account_balance(a.id, 0).await.unwrap();
        scope
            .create_entry(&CreateEntryInput {
                account_id: a.id,
                amount: -100,
            })
            .await
            .unwrap();
        scope.rollback().await.unwrap();

        assert_eq!(store.account(a.id).await.unwrap().balance, 100);
        assert!(store.entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_read_sees_own_pending_balance() {
        let store = MemoryStore::new();
        let a = store.create_account("alice", 100, usd()).await;

        let scope = store.begin().await.unwrap();
        scope.update_account_balance(a.id, 40).await.unwrap();
        let read = scope.get_account_for_update(a.id).await.unwrap();
        assert_eq!(read.balance, 40);
    }

    #[tokio::test]
    async fn test_row_lock_blocks_second_scope_until_commit() {
        let store = MemoryStore::new();
        let a = store.create_account("alice", 100, usd()).await;

        let first = store.begin().await.unwrap();
        first.get_account_for_update(a.id).await.unwrap();
        first.update_account_balance(a.id, 70).await.unwrap();

        let second = store.begin().await.unwrap();
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), second.get_account_for_update(a.id))
                .await;
        assert!(blocked.is_err(), "second scope must wait for the row lock");

        first.commit().await.unwrap();
        let read = second.get_account_for_update(a.id).await.unwrap();
        assert_eq!(read.balance, 70);
    }

    #[tokio::test]
    async fn test_missing_account_behaves_like_foreign_key() {
        let store = MemoryStore::new();
        let a = store.create_account("alice", 100, usd()).await;
        let ghost = AccountId::new();

        let scope = store.begin().await.unwrap();
        let err = scope
            .create_transfer(&CreateTransferInput {
                from_account_id: a.id,
                to_account_id: ghost,
                amount: 5,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));

        let err = scope.get_account_for_update(ghost).await.unwrap_err();
        assert_eq!(err, StoreError::AccountNotFound(ghost));
    }

    #[tokio::test]
    async fn test_injected_fault_trips_once() {
        let store = MemoryStore::new();
        store.inject(Fault::Begin).await;

        assert!(store.begin().await.is_err());
        assert!(store.begin().await.is_ok());
    }

    #[tokio::test]
    async fn test_total_balance() {
        let store = MemoryStore::new();
        store.create_account("alice", i64::MAX, usd()).await;
        store.create_account("bob", i64::MAX, usd()).await;
        assert_eq!(store.total_balance().await, 2 * i128::from(i64::MAX));
    }
}
