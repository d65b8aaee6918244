//! Database seeder for Paygo development and testing.
//!
//! Provisions a few demo wallets and runs sample movements through
//! the transfer engine, so seeded balances always reconcile with the
//! ledger.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use paygo_core::wallet::{DepositRequest, TransferEngine, TransferReason, TransferRequest};
use paygo_db::{PgTransactionLedger, PgWalletStore, connect};
use paygo_shared::config::{DatabaseConfig, WalletConfig};
use paygo_shared::types::{AccountId, Amount};
use uuid::Uuid;

/// Demo user account (consistent across seed runs)
const DEMO_USER_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Second demo user account
const DEMO_PEER_ID: &str = "00000000-0000-0000-0000-000000000002";
/// Demo agent account
const DEMO_AGENT_ID: &str = "00000000-0000-0000-0000-000000000003";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");
    let db_config = DatabaseConfig {
        url: database_url,
        max_connections: 5,
        min_connections: 1,
    };

    println!("Connecting to database...");
    let db = connect(&db_config)
        .await
        .expect("Failed to connect to database");

    let engine = TransferEngine::new(
        Arc::new(PgWalletStore::new(db.clone())),
        Arc::new(PgTransactionLedger::new(db)),
        WalletConfig::default(),
    );

    let user = demo_account(DEMO_USER_ID);
    let peer = demo_account(DEMO_PEER_ID);
    let agent = demo_account(DEMO_AGENT_ID);

    println!("Provisioning demo wallets...");
    for account in [user, peer, agent] {
        let wallet = engine
            .provision_wallet(account)
            .await
            .expect("Failed to provision wallet");
        println!("  {account} -> balance {}", wallet.balance);
    }

    println!("Seeding an agent cash-in...");
    let deposit = engine
        .deposit(DepositRequest {
            to: user,
            amount: Amount::from_minor_units(500),
            reason: TransferReason::CashIn,
            idempotency_key: Some("seed-cash-in-1".to_string()),
        })
        .await
        .expect("Failed to seed cash-in");
    println!("  transaction {} -> {}", deposit.id, deposit.status);

    println!("Seeding a transfer...");
    let transfer = engine
        .transfer(TransferRequest {
            from: user,
            to: peer,
            amount: Amount::from_minor_units(120),
            reason: TransferReason::Transfer,
            idempotency_key: "seed-transfer-1".to_string(),
        })
        .await
        .expect("Failed to seed transfer");
    println!("  transaction {} -> {}", transfer.id, transfer.status);

    println!("Seeding complete!");
}

fn demo_account(id: &str) -> AccountId {
    AccountId::from_uuid(Uuid::parse_str(id).expect("valid demo uuid"))
}
