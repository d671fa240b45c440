//! Concurrent transfer tests against the in-memory engine.
//!
//! These tests verify that:
//! - Opposite transfers between the same two accounts never deadlock
//! - No balance drift occurs regardless of execution order
//! - Total balance is conserved under heavy contention

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_wrap)]

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Barrier;

use remit_core::ledger::LedgerError;
use remit_core::{
    LedgerQueries, LedgerStore, MemoryStore, TransactionScope, TransferParams, TransferService,
    TxExecutor,
};
use remit_shared::types::AccountId;

async fn seed(store: &MemoryStore, balances: &[i64]) -> Vec<AccountId> {
    let mut ids = Vec::with_capacity(balances.len());
    for (i, balance) in balances.iter().enumerate() {
        let account = store
            .create_account(format!("account-{}", i), *balance, "USD".parse().unwrap())
            .await;
        ids.push(account.id);
    }
    ids
}

fn service(store: &MemoryStore) -> Arc<TransferService<MemoryStore>> {
    Arc::new(TransferService::new(TxExecutor::new(store.clone())))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_opposite_transfers_do_not_deadlock() {
    let store = MemoryStore::new();
    let ids = seed(&store, &[100, 100]).await;
    let (a, b) = (ids[0], ids[1]);
    let service = service(&store);

    const PAIRS: usize = 50;
    let barrier = Arc::new(Barrier::new(PAIRS * 2));
    let mut handles = Vec::with_capacity(PAIRS * 2);

    for i in 0..PAIRS * 2 {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        let params = if i % 2 == 0 {
            TransferParams::new(a, b, 10)
        } else {
            TransferParams::new(b, a, 10)
        };

        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            service.transfer(params).await
        }));
    }

    let results = tokio::time::timeout(Duration::from_secs(10), join_all(handles))
        .await
        .expect("transfers deadlocked");

    for result in results {
        result.expect("task panicked").expect("transfer failed");
    }

    assert_eq!(store.account(a).await.unwrap().balance, 100);
    assert_eq!(store.account(b).await.unwrap().balance, 100);
    assert_eq!(store.transfers().await.len(), PAIRS * 2);
    assert_eq!(store.entries().await.len(), PAIRS * 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_transfers_to_one_account_lose_no_updates() {
    let store = MemoryStore::new();
    let ids = seed(&store, &[1_000, 0]).await;
    let (source, sink) = (ids[0], ids[1]);
    let service = service(&store);

    const TRANSFERS: usize = 100;
    let barrier = Arc::new(Barrier::new(TRANSFERS));
    let mut handles = Vec::with_capacity(TRANSFERS);

    for _ in 0..TRANSFERS {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            service.transfer(TransferParams::new(source, sink, 10)).await
        }));
    }

    let success_count = join_all(handles)
        .await
        .into_iter()
        .filter(|result| matches!(result, Ok(Ok(_))))
        .count();

    assert_eq!(success_count, TRANSFERS);
    assert_eq!(store.account(source).await.unwrap().balance, 0);
    assert_eq!(
        store.account(sink).await.unwrap().balance,
        10 * TRANSFERS as i64
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mesh_of_transfers_conserves_total() {
    let store = MemoryStore::new();
    let ids = seed(&store, &[500, 500, 500, 500, 500]).await;
    let service = service(&store);
    let total_before = store.total_balance().await;

    const TRANSFERS: usize = 200;
    let barrier = Arc::new(Barrier::new(TRANSFERS));
    let mut handles = Vec::with_capacity(TRANSFERS);

    for i in 0..TRANSFERS {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        let from = ids[i % ids.len()];
        let to = ids[(i * 7 + 3) % ids.len()];
        let amount = (i % 13) as i64 + 1;

        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            service.transfer(TransferParams::new(from, to, amount)).await
        }));
    }

    for result in join_all(handles).await {
        result.expect("task panicked").expect("transfer failed");
    }

    assert_eq!(store.total_balance().await, total_before);
    let entry_sum: i64 = store.entries().await.iter().map(|e| e.amount).sum();
    assert_eq!(entry_sum, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_timed_out_transfer_releases_row_locks() {
    let store = MemoryStore::new();
    let ids = seed(&store, &[100, 100]).await;
    let (a, b) = (ids[0], ids[1]);
    let bounded = TransferService::new(
        TxExecutor::new(store.clone()).with_timeout(Some(Duration::from_millis(50))),
    );

    // A foreign scope holds the row lock on `a`, so the transfer stalls.
    let scope = store.begin().await.unwrap();
    scope.get_account_for_update(a).await.unwrap();

    let err = bounded
        .transfer(TransferParams::new(a, b, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::TimedOut(_)));

    scope.rollback().await.unwrap();

    bounded.transfer(TransferParams::new(a, b, 10)).await.unwrap();
    assert_eq!(store.account(a).await.unwrap().balance, 90);
    assert_eq!(store.account(b).await.unwrap().balance, 110);
}
