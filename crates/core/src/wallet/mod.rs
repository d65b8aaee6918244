//! The wallet ledger core.
//!
//! This module implements the money-movement subsystem:
//! - Wallet balance records with optimistic versioning
//! - The append-only transaction ledger and its state machine
//! - Storage ports implemented by the in-memory and database backends
//! - The transfer engine that orchestrates debits, credits, and
//!   compensation
//! - Error types for wallet operations

pub mod engine;
pub mod error;
pub mod memory;
pub mod store;
pub mod transaction;
pub mod types;

#[cfg(test)]
mod engine_props;

pub use engine::TransferEngine;
pub use error::WalletError;
pub use memory::{MemoryLedger, MemoryWalletStore};
pub use store::{TransactionLedger, WalletStore};
pub use transaction::{
    FailureCode, Movement, TransactionRecord, TransactionStatus, TransferReason,
};
pub use types::{DepositRequest, TransferRequest, Wallet, WithdrawRequest};
