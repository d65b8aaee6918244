//! Application configuration management.

use serde::Deserialize;

use crate::types::Amount;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Wallet ledger configuration.
    #[serde(default)]
    pub wallet: WalletConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Wallet ledger configuration.
///
/// `initial_balance` is a deployment-level setting applied uniformly
/// when a wallet is provisioned.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Initial funding for newly provisioned wallets, in minor units.
    #[serde(default = "default_initial_balance")]
    pub initial_balance: Amount,
    /// Maximum attempts for an optimistically-concurrent balance
    /// adjustment before the caller sees a busy error.
    #[serde(default = "default_max_adjust_attempts")]
    pub max_adjust_attempts: u32,
    /// Upper bound for the random retry backoff, in milliseconds.
    #[serde(default = "default_retry_jitter_ms")]
    pub retry_jitter_ms: u64,
    /// Maximum attempts for a compensation adjustment before the
    /// transfer is escalated for manual reconciliation.
    #[serde(default = "default_max_compensation_attempts")]
    pub max_compensation_attempts: u32,
    /// Age in seconds after which a pending transaction is considered
    /// abandoned by the recovery sweep.
    #[serde(default = "default_pending_timeout_secs")]
    pub pending_timeout_secs: u64,
}

fn default_initial_balance() -> Amount {
    Amount::from_minor_units(50)
}

fn default_max_adjust_attempts() -> u32 {
    4
}

fn default_retry_jitter_ms() -> u64 {
    25
}

fn default_max_compensation_attempts() -> u32 {
    8
}

fn default_pending_timeout_secs() -> u64 {
    300
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            initial_balance: default_initial_balance(),
            max_adjust_attempts: default_max_adjust_attempts(),
            retry_jitter_ms: default_retry_jitter_ms(),
            max_compensation_attempts: default_max_compensation_attempts(),
            pending_timeout_secs: default_pending_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("PAYGO").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
