//! Wallet domain types and engine inputs.

use chrono::{DateTime, Utc};
use paygo_shared::types::{AccountId, Amount};
use serde::{Deserialize, Serialize};

use super::transaction::TransferReason;

/// Per-account balance record.
///
/// One wallet exists per account, created at account-creation time and
/// never deleted, only deactivated. The balance is non-negative at
/// every point observable outside an in-flight adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// The owning account.
    pub account_id: AccountId,
    /// Current balance in minor units. Never negative.
    pub balance: Amount,
    /// Frozen wallets reject all debits and credits.
    pub is_active: bool,
    /// Optimistic concurrency token; increments on every mutation.
    pub version: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Creates a new active wallet at version 1.
    #[must_use]
    pub fn new(account_id: AccountId, balance: Amount) -> Self {
        let now = Utc::now();
        Self {
            account_id,
            balance,
            is_active: true,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for a wallet-to-wallet transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    /// The debited account.
    pub from: AccountId,
    /// The credited account.
    pub to: AccountId,
    /// Amount to move, in minor units. Must be positive.
    pub amount: Amount,
    /// Reporting classification.
    pub reason: TransferReason,
    /// Replay-protection token. Required: network retries must never
    /// double-move money.
    pub idempotency_key: String,
}

/// Input for a pure credit (cash-in, external funding).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRequest {
    /// The credited account.
    pub to: AccountId,
    /// Amount to credit, in minor units. Must be positive.
    pub amount: Amount,
    /// Reporting classification (`CashIn` or `Funding`).
    pub reason: TransferReason,
    /// Optional replay-protection token.
    pub idempotency_key: Option<String>,
}

/// Input for a pure debit (cash-out, withdrawal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRequest {
    /// The debited account.
    pub from: AccountId,
    /// Amount to debit, in minor units. Must be positive.
    pub amount: Amount,
    /// Optional replay-protection token.
    pub idempotency_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_wallet_is_active_at_version_one() {
        let wallet = Wallet::new(AccountId::new(), Amount::from_minor_units(50));
        assert!(wallet.is_active);
        assert_eq!(wallet.version, 1);
        assert_eq!(wallet.balance, Amount::from_minor_units(50));
        assert_eq!(wallet.created_at, wallet.updated_at);
    }
}
