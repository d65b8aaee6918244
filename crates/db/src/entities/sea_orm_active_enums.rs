//! Database enum mappings for the transactions table.
//!
//! Each enum mirrors its `paygo-core` counterpart; the `From`
//! conversions keep the repositories free of string matching.

use paygo_core::wallet::transaction as domain;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction status column.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_status")]
pub enum TransactionStatus {
    /// In flight.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Terminal: applied.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Terminal: no net balance change.
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Movement classification column.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transfer_reason")]
pub enum TransferReason {
    /// Wallet-to-wallet transfer.
    #[sea_orm(string_value = "transfer")]
    Transfer,
    /// Agent cash-in credit.
    #[sea_orm(string_value = "cash_in")]
    CashIn,
    /// Agent cash-out debit.
    #[sea_orm(string_value = "cash_out")]
    CashOut,
    /// Initial wallet funding.
    #[sea_orm(string_value = "funding")]
    Funding,
    /// Fee or commission posting.
    #[sea_orm(string_value = "fee")]
    Fee,
    /// Reversal of a previous transaction.
    #[sea_orm(string_value = "reversal")]
    Reversal,
}

/// Failure reason column for failed records.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "failure_code")]
pub enum FailureCode {
    /// Source wallet could not cover the debit.
    #[sea_orm(string_value = "insufficient_funds")]
    InsufficientFunds,
    /// Source wallet does not exist.
    #[sea_orm(string_value = "source_not_found")]
    SourceNotFound,
    /// Destination wallet does not exist.
    #[sea_orm(string_value = "destination_not_found")]
    DestinationNotFound,
    /// Source wallet is frozen.
    #[sea_orm(string_value = "source_inactive")]
    SourceInactive,
    /// Destination wallet is frozen.
    #[sea_orm(string_value = "destination_inactive")]
    DestinationInactive,
    /// Optimistic retries exhausted.
    #[sea_orm(string_value = "busy")]
    Busy,
    /// Debit reversal could not be applied.
    #[sea_orm(string_value = "compensation_failed")]
    CompensationFailed,
    /// Closed by the recovery sweep after a crash.
    #[sea_orm(string_value = "interrupted")]
    Interrupted,
    /// Backend store failed mid-transfer.
    #[sea_orm(string_value = "store_error")]
    StoreError,
}

impl From<domain::TransactionStatus> for TransactionStatus {
    fn from(status: domain::TransactionStatus) -> Self {
        match status {
            domain::TransactionStatus::Pending => Self::Pending,
            domain::TransactionStatus::Completed => Self::Completed,
            domain::TransactionStatus::Failed => Self::Failed,
        }
    }
}

impl From<TransactionStatus> for domain::TransactionStatus {
    fn from(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Pending => Self::Pending,
            TransactionStatus::Completed => Self::Completed,
            TransactionStatus::Failed => Self::Failed,
        }
    }
}

impl From<domain::TransferReason> for TransferReason {
    fn from(reason: domain::TransferReason) -> Self {
        match reason {
            domain::TransferReason::Transfer => Self::Transfer,
            domain::TransferReason::CashIn => Self::CashIn,
            domain::TransferReason::CashOut => Self::CashOut,
            domain::TransferReason::Funding => Self::Funding,
            domain::TransferReason::Fee => Self::Fee,
            domain::TransferReason::Reversal => Self::Reversal,
        }
    }
}

impl From<TransferReason> for domain::TransferReason {
    fn from(reason: TransferReason) -> Self {
        match reason {
            TransferReason::Transfer => Self::Transfer,
            TransferReason::CashIn => Self::CashIn,
            TransferReason::CashOut => Self::CashOut,
            TransferReason::Funding => Self::Funding,
            TransferReason::Fee => Self::Fee,
            TransferReason::Reversal => Self::Reversal,
        }
    }
}

impl From<domain::FailureCode> for FailureCode {
    fn from(code: domain::FailureCode) -> Self {
        match code {
            domain::FailureCode::InsufficientFunds => Self::InsufficientFunds,
            domain::FailureCode::SourceNotFound => Self::SourceNotFound,
            domain::FailureCode::DestinationNotFound => Self::DestinationNotFound,
            domain::FailureCode::SourceInactive => Self::SourceInactive,
            domain::FailureCode::DestinationInactive => Self::DestinationInactive,
            domain::FailureCode::Busy => Self::Busy,
            domain::FailureCode::CompensationFailed => Self::CompensationFailed,
            domain::FailureCode::Interrupted => Self::Interrupted,
            domain::FailureCode::Store => Self::StoreError,
        }
    }
}

impl From<FailureCode> for domain::FailureCode {
    fn from(code: FailureCode) -> Self {
        match code {
            FailureCode::InsufficientFunds => Self::InsufficientFunds,
            FailureCode::SourceNotFound => Self::SourceNotFound,
            FailureCode::DestinationNotFound => Self::DestinationNotFound,
            FailureCode::SourceInactive => Self::SourceInactive,
            FailureCode::DestinationInactive => Self::DestinationInactive,
            FailureCode::Busy => Self::Busy,
            FailureCode::CompensationFailed => Self::CompensationFailed,
            FailureCode::Interrupted => Self::Interrupted,
            FailureCode::StoreError => Self::Store,
        }
    }
}
