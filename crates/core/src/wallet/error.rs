//! Wallet ledger error types.
//!
//! This module defines all errors that can occur during wallet and
//! transfer operations: validation errors, wallet state errors,
//! concurrency errors, and ledger state-machine errors.

use paygo_shared::types::{AccountId, Amount, TransactionId};
use thiserror::Error;

use super::transaction::TransactionStatus;

/// Errors that can occur during wallet ledger operations.
#[derive(Debug, Clone, Error)]
pub enum WalletError {
    // ========== Validation Errors ==========
    /// Transfer amount must be strictly positive.
    #[error("Transfer amount must be positive, got {0}")]
    InvalidAmount(Amount),

    /// Source and destination accounts must differ.
    #[error("Source and destination are the same account: {0}")]
    SameAccount(AccountId),

    // ========== Wallet Errors ==========
    /// No wallet exists for the account.
    #[error("No wallet found for account {0}")]
    NotFound(AccountId),

    /// A wallet already exists for the account.
    #[error("A wallet already exists for account {0}")]
    AlreadyExists(AccountId),

    /// The wallet is frozen and rejects all debits and credits.
    #[error("Wallet for account {0} is inactive")]
    WalletInactive(AccountId),

    /// The debit would take the balance below zero.
    #[error("Insufficient funds in wallet {account}")]
    InsufficientFunds {
        /// The account whose wallet refused the debit.
        account: AccountId,
    },

    // ========== Concurrency Errors ==========
    /// The wallet was modified concurrently; re-read and retry.
    #[error("Version conflict on wallet {account}: expected {expected}, found {actual}")]
    VersionConflict {
        /// The account whose wallet was concurrently modified.
        account: AccountId,
        /// The version the caller expected.
        expected: i64,
        /// The version actually found.
        actual: i64,
    },

    /// Retries were exhausted under contention.
    #[error("Wallet for account {0} is busy, please retry")]
    Busy(AccountId),

    // ========== Ledger State Errors ==========
    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// A terminal transaction record cannot transition again.
    #[error("Transaction {id} is already {status} and cannot transition")]
    InvalidTransition {
        /// The transaction whose transition was refused.
        id: TransactionId,
        /// The terminal status it already holds.
        status: TransactionStatus,
    },

    /// A transfer was found pending after a crash; whether its debit
    /// leg applied is unknown and must be reconciled manually.
    #[error("Transaction {0} was interrupted and needs reconciliation")]
    Interrupted(TransactionId),

    // ========== Fatal Errors ==========
    /// The debit of a failed transfer could not be reversed.
    #[error("Compensation failed for transaction {id}: wallet {account} must be reconciled")]
    CompensationFailed {
        /// The failed transfer.
        id: TransactionId,
        /// The debited account left short.
        account: AccountId,
    },

    /// Backend storage error.
    #[error("Store error: {0}")]
    Store(String),
}

impl WalletError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::SameAccount(_) => "SAME_ACCOUNT",
            Self::NotFound(_) => "WALLET_NOT_FOUND",
            Self::AlreadyExists(_) => "WALLET_ALREADY_EXISTS",
            Self::WalletInactive(_) => "WALLET_INACTIVE",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::VersionConflict { .. } => "VERSION_CONFLICT",
            Self::Busy(_) => "BUSY",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Interrupted(_) => "TRANSFER_INTERRUPTED",
            Self::CompensationFailed { .. } => "COMPENSATION_FAILED",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InvalidAmount(_) | Self::SameAccount(_) => 400,

            // 404 Not Found
            Self::NotFound(_) | Self::TransactionNotFound(_) => 404,

            // 409 Conflict - duplicates and concurrency
            Self::AlreadyExists(_) | Self::VersionConflict { .. } | Self::Busy(_) => 409,

            // 422 Unprocessable - business rule refusals
            Self::WalletInactive(_) | Self::InsufficientFunds { .. } => 422,

            // 500 Internal Server Error
            Self::InvalidTransition { .. }
            | Self::Interrupted(_)
            | Self::CompensationFailed { .. }
            | Self::Store(_) => 500,
        }
    }

    /// Returns true if this error is transient and worth retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::VersionConflict { .. } | Self::Busy(_))
    }
}
