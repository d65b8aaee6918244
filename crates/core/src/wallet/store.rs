//! Storage ports for the wallet ledger.
//!
//! The transfer engine is written against these traits so the same
//! orchestration runs over the in-memory backend (tests, local
//! development) and the PostgreSQL repositories. Implementations must
//! provide single-wallet atomicity for `adjust_balance`; the engine
//! builds multi-wallet transfers out of that guarantee and never asks
//! for cross-wallet atomicity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paygo_shared::types::{AccountId, Amount, PageRequest, PageResponse, TransactionId};

use super::error::WalletError;
use super::transaction::{FailureCode, TransactionRecord};
use super::types::Wallet;

/// Holds and mutates balances with strict consistency.
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Creates a wallet for the account.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the account already has a wallet;
    /// duplicate creation attempts must not double-fund.
    async fn create_wallet(
        &self,
        account_id: AccountId,
        initial_balance: Amount,
    ) -> Result<Wallet, WalletError>;

    /// Returns the current wallet snapshot.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no wallet exists for the account.
    async fn get(&self, account_id: AccountId) -> Result<Wallet, WalletError>;

    /// Atomically applies `delta` (positive or negative) to the
    /// balance, but only if the stored version matches
    /// `expected_version`, the wallet is active, and the resulting
    /// balance stays non-negative. On success the version increments
    /// and the updated wallet is returned.
    ///
    /// # Errors
    ///
    /// `VersionConflict` (re-read and retry), `WalletInactive`,
    /// `InsufficientFunds`, or `NotFound`.
    async fn adjust_balance(
        &self,
        account_id: AccountId,
        delta: Amount,
        expected_version: i64,
    ) -> Result<Wallet, WalletError>;

    /// Freezes or unfreezes the wallet. Last write wins.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no wallet exists for the account.
    async fn set_active(&self, account_id: AccountId, is_active: bool)
    -> Result<Wallet, WalletError>;
}

/// Durable, append-only transaction history.
///
/// Rows are never deleted or rewritten; corrections are new records
/// linked through `reversal_of`.
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Persists a `Pending` attempt before any balance mutation.
    ///
    /// # Errors
    ///
    /// Returns `Busy` if another in-flight record already holds the
    /// same idempotency key.
    async fn record_attempt(
        &self,
        record: TransactionRecord,
    ) -> Result<TransactionRecord, WalletError>;

    /// Transitions a pending record to `Completed`, exactly once.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if the record is already terminal,
    /// `TransactionNotFound` if the id is unknown.
    async fn mark_completed(&self, id: TransactionId) -> Result<TransactionRecord, WalletError>;

    /// Transitions a pending record to `Failed`, exactly once.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if the record is already terminal,
    /// `TransactionNotFound` if the id is unknown.
    async fn mark_failed(
        &self,
        id: TransactionId,
        code: FailureCode,
    ) -> Result<TransactionRecord, WalletError>;

    /// Looks up a record by id.
    async fn find(&self, id: TransactionId) -> Result<Option<TransactionRecord>, WalletError>;

    /// Looks up a record by idempotency key, for replay detection.
    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<TransactionRecord>, WalletError>;

    /// Transactions touching the account on either side, newest first.
    async fn list_for_account(
        &self,
        account_id: AccountId,
        page: &PageRequest,
    ) -> Result<PageResponse<TransactionRecord>, WalletError>;

    /// Pending records created before `cutoff`, for the recovery
    /// sweep.
    async fn list_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<TransactionRecord>, WalletError>;
}
