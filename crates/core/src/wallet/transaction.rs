//! Ledger transaction records.
//!
//! A transaction is the permanent record of one attempted money
//! movement. It is created `Pending`, moves to exactly one terminal
//! state (`Completed` or `Failed`), and is never edited afterwards.
//! Corrections are new records linked through `reversal_of`.

use chrono::{DateTime, Utc};
use paygo_shared::types::{AccountId, Amount, TransactionId};
use serde::{Deserialize, Serialize};

use super::error::WalletError;

/// Transaction status.
///
/// `Pending` records are in flight; `Completed` and `Failed` are
/// terminal and immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Recorded, balance mutation not yet concluded.
    Pending,
    /// Both legs applied; balances reflect this record.
    Completed,
    /// No net balance change attributable to this record.
    Failed,
}

impl TransactionStatus {
    /// Returns true if the status is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Classification of a movement for reporting.
///
/// Reasons do not affect ledger correctness, only how the record reads
/// in statements and audits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferReason {
    /// Wallet-to-wallet transfer.
    Transfer,
    /// Cash handed to an agent, credited as e-money.
    CashIn,
    /// E-money debited, cash paid out by an agent.
    CashOut,
    /// Initial wallet funding at provisioning time.
    Funding,
    /// Service fee or agent commission posting.
    Fee,
    /// Reversal of a previous transaction.
    Reversal,
}

/// Why a failed transaction did not change balances.
///
/// Stored on the record so the audit trail can explain every
/// non-completion without consulting logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    /// The source wallet could not cover the debit.
    InsufficientFunds,
    /// The source wallet does not exist.
    SourceNotFound,
    /// The destination wallet does not exist.
    DestinationNotFound,
    /// The source wallet is frozen.
    SourceInactive,
    /// The destination wallet is frozen.
    DestinationInactive,
    /// Optimistic retries were exhausted under contention.
    Busy,
    /// The debit leg could not be reversed after a failed credit leg.
    CompensationFailed,
    /// Found pending after a crash and closed by the recovery sweep.
    Interrupted,
    /// The backing store failed mid-transfer.
    Store,
}

/// The endpoints of a movement.
///
/// A pure credit (external funding, cash-in) has no source and a pure
/// debit (cash-out) has no destination; a transfer has both. Encoding
/// this as an enum makes a record with neither endpoint
/// unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Movement {
    /// Wallet-to-wallet: debit `from`, credit `to`.
    Transfer {
        /// The debited account.
        from: AccountId,
        /// The credited account.
        to: AccountId,
    },
    /// Pure credit from outside the ledger.
    Credit {
        /// The credited account.
        to: AccountId,
    },
    /// Pure debit leaving the ledger.
    Debit {
        /// The debited account.
        from: AccountId,
    },
}

impl Movement {
    /// The debited account, if any.
    #[must_use]
    pub const fn from_account(self) -> Option<AccountId> {
        match self {
            Self::Transfer { from, .. } | Self::Debit { from } => Some(from),
            Self::Credit { .. } => None,
        }
    }

    /// The credited account, if any.
    #[must_use]
    pub const fn to_account(self) -> Option<AccountId> {
        match self {
            Self::Transfer { to, .. } | Self::Credit { to } => Some(to),
            Self::Debit { .. } => None,
        }
    }

    /// Returns true if the movement touches the given account on
    /// either side.
    #[must_use]
    pub fn touches(self, account: AccountId) -> bool {
        self.from_account() == Some(account) || self.to_account() == Some(account)
    }

    /// One endpoint of the movement, preferring the debited side.
    ///
    /// Used where an error must name a wallet and the movement is the
    /// only context available.
    #[must_use]
    pub fn primary_account(self) -> AccountId {
        match self {
            Self::Transfer { from, .. } | Self::Debit { from } => from,
            Self::Credit { to } => to,
        }
    }
}

/// One attempted money movement, as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique id, generated at creation.
    pub id: TransactionId,
    /// The movement's endpoints.
    pub movement: Movement,
    /// The amount moved, in minor units. Strictly positive.
    pub amount: Amount,
    /// Reporting classification.
    pub reason: TransferReason,
    /// Current status.
    pub status: TransactionStatus,
    /// Set when `status` is `Failed`.
    pub failure_code: Option<FailureCode>,
    /// Caller-supplied replay-protection token, unique across records.
    pub idempotency_key: Option<String>,
    /// The transaction this record reverses, if it is a correction.
    pub reversal_of: Option<TransactionId>,
    /// When the attempt was recorded.
    pub created_at: DateTime<Utc>,
    /// When the record reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
}

impl TransactionRecord {
    /// Creates a new `Pending` attempt record.
    #[must_use]
    pub fn attempt(
        movement: Movement,
        amount: Amount,
        reason: TransferReason,
        idempotency_key: Option<String>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            movement,
            amount,
            reason,
            status: TransactionStatus::Pending,
            failure_code: None,
            idempotency_key,
            reversal_of: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Links this record to the transaction it reverses.
    #[must_use]
    pub fn reversing(mut self, original: TransactionId) -> Self {
        self.reversal_of = Some(original);
        self
    }

    /// Returns true if the record is in a terminal status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Transitions a pending record to `Completed`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the record is already terminal.
    pub fn complete(mut self) -> Result<Self, WalletError> {
        self.ensure_pending()?;
        self.status = TransactionStatus::Completed;
        self.completed_at = Some(Utc::now());
        Ok(self)
    }

    /// Transitions a pending record to `Failed` with a reason code.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the record is already terminal.
    pub fn fail(mut self, code: FailureCode) -> Result<Self, WalletError> {
        self.ensure_pending()?;
        self.status = TransactionStatus::Failed;
        self.failure_code = Some(code);
        self.completed_at = Some(Utc::now());
        Ok(self)
    }

    fn ensure_pending(&self) -> Result<(), WalletError> {
        if self.status.is_terminal() {
            return Err(WalletError::InvalidTransition {
                id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    /// Reconstructs the typed failure a failed record represents.
    ///
    /// Used for idempotent replay: a retried request whose key matched
    /// a failed terminal record observes the same error as the
    /// original call, without any mutation being re-applied.
    ///
    /// Returns `None` for records that are not failed.
    #[must_use]
    pub fn failure_error(&self) -> Option<WalletError> {
        if self.status != TransactionStatus::Failed {
            return None;
        }
        let fallback = self.movement.primary_account();
        Some(match self.failure_code {
            Some(FailureCode::InsufficientFunds) => WalletError::InsufficientFunds {
                account: self.movement.from_account().unwrap_or(fallback),
            },
            Some(FailureCode::SourceNotFound) => {
                WalletError::NotFound(self.movement.from_account().unwrap_or(fallback))
            }
            Some(FailureCode::DestinationNotFound) => {
                WalletError::NotFound(self.movement.to_account().unwrap_or(fallback))
            }
            Some(FailureCode::SourceInactive) => {
                WalletError::WalletInactive(self.movement.from_account().unwrap_or(fallback))
            }
            Some(FailureCode::DestinationInactive) => {
                WalletError::WalletInactive(self.movement.to_account().unwrap_or(fallback))
            }
            Some(FailureCode::Busy) => WalletError::Busy(fallback),
            Some(FailureCode::CompensationFailed) => WalletError::CompensationFailed {
                id: self.id,
                account: fallback,
            },
            Some(FailureCode::Interrupted) => WalletError::Interrupted(self.id),
            Some(FailureCode::Store) | None => {
                WalletError::Store(format!("transaction {} failed in the store", self.id))
            }
        })
    }
}
