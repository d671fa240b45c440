//! Database seeder for Remit development and testing.
//!
//! Creates two demo accounts (or reuses them when they already exist) and
//! moves 30 units from the first to the second through the transfer service.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use remit_core::{TransferParams, TransferService, TxExecutor};
use remit_db::repositories::{AccountFilter, CreateAccountInput};
use remit_db::{AccountRepository, PgLedgerStore};
use remit_shared::AppConfig;
use remit_shared::types::PageRequest;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Demo account holders and their opening balances.
const DEMO_ACCOUNTS: [(&str, i64); 2] = [("demo-alice", 100), ("demo-bob", 50)];

/// Amount moved by the sample transfer.
const SAMPLE_AMOUNT: i64 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "remit=debug,seeder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = remit_db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    let accounts = AccountRepository::new(db.clone());
    let mut ids = Vec::with_capacity(DEMO_ACCOUNTS.len());
    for (owner, balance) in DEMO_ACCOUNTS {
        let existing = accounts
            .list_accounts(
                AccountFilter {
                    owner: Some(owner.to_string()),
                },
                PageRequest::new(1, 1),
            )
            .await?;

        let account = match existing.data.into_iter().next() {
            Some(account) => {
                info!(%owner, id = %account.id, "Demo account already exists, skipping");
                account
            }
            None => {
                let account = accounts
                    .create_account(CreateAccountInput {
                        owner: owner.to_string(),
                        balance,
                        currency: "USD".parse()?,
                    })
                    .await?;
                info!(%owner, id = %account.id, balance, "Demo account created");
                account
            }
        };
        ids.push(account.id);
    }

    let store = PgLedgerStore::from_config(db, &config.database);
    let service = TransferService::new(TxExecutor::from_config(store, &config.ledger));

    let result = service
        .transfer(TransferParams::new(ids[0], ids[1], SAMPLE_AMOUNT))
        .await
        .context("Sample transfer failed")?;

    info!(
        transfer_id = %result.transfer.id,
        from_balance = result.from_account.balance,
        to_balance = result.to_account.balance,
        "Sample transfer committed"
    );

    Ok(())
}
