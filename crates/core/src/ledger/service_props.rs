//! Property-based tests for TransferService.
//!
//! - Conservation: the sum of all balances never changes.
//! - Every committed transfer writes exactly two entries summing to zero.
//! - Rejected or failed transfers leave no rows behind.

use proptest::prelude::*;
use remit_shared::types::AccountId;

use super::error::LedgerError;
use super::service::TransferService;
use super::types::TransferParams;
use crate::executor::TxExecutor;
use crate::store::{Fault, MemoryStore};

const ACCOUNTS: usize = 4;

/// Strategy for one transfer between two of the fixture accounts.
///
/// Amounts include zero and negatives so rejected requests are mixed in.
fn transfer_op() -> impl Strategy<Value = (usize, usize, i64)> {
    (0..ACCOUNTS, 0..ACCOUNTS, -50i64..1_000)
}

fn initial_balances() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(0i64..10_000, ACCOUNTS)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

async fn seeded_store(balances: &[i64]) -> (MemoryStore, Vec<AccountId>) {
    let store = MemoryStore::new();
    let mut ids = Vec::with_capacity(balances.len());
    for (i, balance) in balances.iter().enumerate() {
        let account = store
            .create_account(format!("owner-{i}"), *balance, "USD".parse().unwrap())
            .await;
        ids.push(account.id);
    }
    (store, ids)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Total balance is invariant over any sequence of transfers.
    #[test]
    fn prop_total_balance_is_conserved(
        balances in initial_balances(),
        ops in prop::collection::vec(transfer_op(), 1..20),
    ) {
        let rt = runtime();
        let (total_before, total_after) = rt.block_on(async {
            let (store, ids) = seeded_store(&balances).await;
            let service = TransferService::new(TxExecutor::new(store.clone()));
            let before = store.total_balance().await;

            for (from, to, amount) in &ops {
                let _ = service
                    .transfer(TransferParams::new(ids[*from], ids[*to], *amount))
                    .await;
            }

            (before, store.total_balance().await)
        });

        prop_assert_eq!(total_before, total_after);
    }

    /// Entries come in zero-sum pairs, one pair per committed transfer.
    #[test]
    fn prop_entries_pair_up_with_transfers(
        balances in initial_balances(),
        ops in prop::collection::vec(transfer_op(), 1..20),
    ) {
        let rt = runtime();
        let (accepted, transfers, entries) = rt.block_on(async {
            let (store, ids) = seeded_store(&balances).await;
            let service = TransferService::new(TxExecutor::new(store.clone()));
            let mut accepted = 0usize;

            for (from, to, amount) in &ops {
                match service
                    .transfer(TransferParams::new(ids[*from], ids[*to], *amount))
                    .await
                {
                    Ok(_) => accepted += 1,
                    Err(LedgerError::InvalidAmount(_)) => {}
                    Err(other) => panic!("unexpected failure: {other}"),
                }
            }

            (accepted, store.transfers().await, store.entries().await)
        });

        let expected = ops.iter().filter(|(_, _, amount)| *amount > 0).count();
        prop_assert_eq!(accepted, expected);
        prop_assert_eq!(transfers.len(), accepted);
        prop_assert_eq!(entries.len(), accepted * 2);
        prop_assert_eq!(entries.iter().map(|e| i128::from(e.amount)).sum::<i128>(), 0);
    }

    /// A failing final step leaves every balance exactly as it was.
    #[test]
    fn prop_failed_transfer_changes_nothing(
        balances in initial_balances(),
        (from, to, amount) in (0..ACCOUNTS, 0..ACCOUNTS, 1i64..1_000),
    ) {
        let rt = runtime();
        let (before, after, rows) = rt.block_on(async {
            let (store, ids) = seeded_store(&balances).await;
            let service = TransferService::new(TxExecutor::new(store.clone()));
            let before = store.accounts().await;

            store.inject(Fault::UpdateBalance(ids[to])).await;
            let result = service
                .transfer(TransferParams::new(ids[from], ids[to], amount))
                .await;
            assert!(result.is_err());

            let rows = store.transfers().await.len() + store.entries().await.len();
            (before, store.accounts().await, rows)
        });

        prop_assert_eq!(before, after);
        prop_assert_eq!(rows, 0);
    }
}
