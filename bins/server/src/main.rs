//! Paygo API Server
//!
//! Main entry point for the Paygo wallet backend service.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paygo_api::{AppState, create_router};
use paygo_core::wallet::TransferEngine;
use paygo_db::{PgTransactionLedger, PgWalletStore, connect};
use paygo_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paygo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database).await?;
    info!("Connected to database");

    // Wire the transfer engine over the PostgreSQL stores
    let engine = Arc::new(TransferEngine::new(
        Arc::new(PgWalletStore::new(db.clone())),
        Arc::new(PgTransactionLedger::new(db)),
        config.wallet.clone(),
    ));

    // Close out transactions stranded by a previous crash, then keep
    // sweeping in the background.
    spawn_recovery_sweep(engine.clone(), config.wallet.pending_timeout_secs);

    // Create application state
    let state = AppState { engine };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Runs the stale-pending recovery sweep once at startup and then
/// periodically. A pending record only outlives its request on a
/// crash, so the sweep is usually a no-op.
fn spawn_recovery_sweep(engine: Arc<TransferEngine>, pending_timeout_secs: u64) {
    let period = Duration::from_secs(pending_timeout_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match engine.recover_stale_pending().await {
                Ok(closed) if closed.is_empty() => {}
                Ok(closed) => info!(count = closed.len(), "closed stale pending transactions"),
                Err(e) => error!(error = %e, "recovery sweep failed"),
            }
        }
    });
}
