//! The transfer engine.
//!
//! The only component authorized to change balances. Every movement
//! follows the same protocol: validate, check the idempotency key,
//! record a `Pending` transaction, apply the debit and credit legs as
//! single-wallet atomic adjustments, and drive the record to a
//! terminal state. There is no cross-wallet lock; a failed credit leg
//! is compensated by reversing the already-applied debit.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use paygo_shared::config::WalletConfig;
use paygo_shared::types::{AccountId, Amount, PageRequest, PageResponse, TransactionId};
use rand::Rng;
use tracing::{debug, error, info, warn};

use super::error::WalletError;
use super::store::{TransactionLedger, WalletStore};
use super::transaction::{
    FailureCode, Movement, TransactionRecord, TransactionStatus, TransferReason,
};
use super::types::{DepositRequest, TransferRequest, Wallet, WithdrawRequest};

/// Which leg of a movement an error came from.
#[derive(Debug, Clone, Copy)]
enum Leg {
    Debit,
    Credit,
}

/// Orchestrates balance changes over the wallet store and the
/// transaction ledger.
///
/// Cheap to clone; clones share the underlying stores.
#[derive(Clone)]
pub struct TransferEngine {
    wallets: Arc<dyn WalletStore>,
    ledger: Arc<dyn TransactionLedger>,
    config: WalletConfig,
}

impl TransferEngine {
    /// Creates an engine over the given stores.
    #[must_use]
    pub fn new(
        wallets: Arc<dyn WalletStore>,
        ledger: Arc<dyn TransactionLedger>,
        config: WalletConfig,
    ) -> Self {
        Self {
            wallets,
            ledger,
            config,
        }
    }

    /// Moves `amount` from one wallet to another.
    ///
    /// The full contract:
    /// 1. Rejects non-positive amounts and identical endpoints before
    ///    anything is recorded.
    /// 2. Replays the recorded outcome if the idempotency key was
    ///    already used for a terminal transaction; no mutation is
    ///    re-applied.
    /// 3. Records a `Pending` transaction, then applies the debit and
    ///    credit legs. A failed credit leg is compensated by reversing
    ///    the debit before the record is marked `Failed`.
    /// 4. Once the attempt is recorded it always reaches a terminal
    ///    state, even if the caller drops the returned future.
    pub async fn transfer(&self, request: TransferRequest) -> Result<TransactionRecord, WalletError> {
        if !request.amount.is_positive() {
            return Err(WalletError::InvalidAmount(request.amount));
        }
        if request.from == request.to {
            return Err(WalletError::SameAccount(request.from));
        }
        if let Some(prior) = self.check_replay(&request.idempotency_key).await? {
            return Ok(prior);
        }

        let record = TransactionRecord::attempt(
            Movement::Transfer {
                from: request.from,
                to: request.to,
            },
            request.amount,
            request.reason,
            Some(request.idempotency_key),
        );
        self.run_to_terminal(record).await
    }

    /// Credits a wallet from outside the ledger (cash-in, funding).
    pub async fn deposit(&self, request: DepositRequest) -> Result<TransactionRecord, WalletError> {
        if !request.amount.is_positive() {
            return Err(WalletError::InvalidAmount(request.amount));
        }
        if let Some(key) = &request.idempotency_key
            && let Some(prior) = self.check_replay(key).await?
        {
            return Ok(prior);
        }

        let record = TransactionRecord::attempt(
            Movement::Credit { to: request.to },
            request.amount,
            request.reason,
            request.idempotency_key,
        );
        self.run_to_terminal(record).await
    }

    /// Debits a wallet out of the ledger (cash-out, withdrawal).
    pub async fn withdraw(
        &self,
        request: WithdrawRequest,
    ) -> Result<TransactionRecord, WalletError> {
        if !request.amount.is_positive() {
            return Err(WalletError::InvalidAmount(request.amount));
        }
        if let Some(key) = &request.idempotency_key
            && let Some(prior) = self.check_replay(key).await?
        {
            return Ok(prior);
        }

        let record = TransactionRecord::attempt(
            Movement::Debit { from: request.from },
            request.amount,
            TransferReason::CashOut,
            request.idempotency_key,
        );
        self.run_to_terminal(record).await
    }

    /// Provisions a wallet for a new account.
    ///
    /// An explicit step in account-creation orchestration: creates the
    /// wallet at zero balance, then applies the configured initial
    /// funding as a ledger-visible deposit under a deterministic
    /// idempotency key. Safe to retry; a retry can neither create a
    /// second wallet nor fund the first one twice.
    pub async fn provision_wallet(&self, account_id: AccountId) -> Result<Wallet, WalletError> {
        match self.wallets.create_wallet(account_id, Amount::ZERO).await {
            Ok(_) => info!(%account_id, "wallet provisioned"),
            Err(WalletError::AlreadyExists(_)) => {
                debug!(%account_id, "wallet already provisioned");
            }
            Err(e) => return Err(e),
        }

        if self.config.initial_balance.is_positive() {
            let funding = DepositRequest {
                to: account_id,
                amount: self.config.initial_balance,
                reason: TransferReason::Funding,
                idempotency_key: Some(format!("wallet-funding-{account_id}")),
            };
            match self.deposit(funding).await {
                Ok(_) => {}
                // A concurrent provisioning call is mid-funding; the
                // credit is theirs to finish.
                Err(WalletError::Busy(_)) => {}
                Err(e) => return Err(e),
            }
        }

        self.wallets.get(account_id).await
    }

    /// Returns the current wallet snapshot for the account.
    pub async fn get_wallet(&self, account_id: AccountId) -> Result<Wallet, WalletError> {
        self.wallets.get(account_id).await
    }

    /// Paginated transaction history for the account, newest first.
    pub async fn history(
        &self,
        account_id: AccountId,
        page: &PageRequest,
    ) -> Result<PageResponse<TransactionRecord>, WalletError> {
        self.ledger.list_for_account(account_id, page).await
    }

    /// Looks up a single transaction record.
    pub async fn find_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionRecord>, WalletError> {
        self.ledger.find(id).await
    }

    /// Freezes the wallet; frozen wallets reject all debits and
    /// credits.
    pub async fn freeze(&self, account_id: AccountId) -> Result<Wallet, WalletError> {
        info!(%account_id, "freezing wallet");
        self.wallets.set_active(account_id, false).await
    }

    /// Unfreezes the wallet.
    pub async fn unfreeze(&self, account_id: AccountId) -> Result<Wallet, WalletError> {
        info!(%account_id, "unfreezing wallet");
        self.wallets.set_active(account_id, true).await
    }

    /// Closes out pending records older than the configured timeout.
    ///
    /// Such records can only result from a crash: in-process, every
    /// recorded attempt is driven to a terminal state even if its
    /// caller goes away. Whether the debit leg of an interrupted
    /// transfer applied is unknown, so the sweep does not guess a
    /// compensation; it marks the record `Failed` with code
    /// `interrupted` and leaves reconciliation to an operator.
    ///
    /// Returns the ids of the records it closed.
    pub async fn recover_stale_pending(&self) -> Result<Vec<TransactionId>, WalletError> {
        let timeout = i64::try_from(self.config.pending_timeout_secs).unwrap_or(i64::MAX);
        let cutoff = Utc::now() - chrono::Duration::seconds(timeout);
        let stale = self.ledger.list_stale_pending(cutoff).await?;

        let mut closed = Vec::with_capacity(stale.len());
        for record in stale {
            match self
                .ledger
                .mark_failed(record.id, FailureCode::Interrupted)
                .await
            {
                Ok(_) => {
                    warn!(
                        transaction_id = %record.id,
                        created_at = %record.created_at,
                        "stale pending transaction closed; needs manual reconciliation"
                    );
                    closed.push(record.id);
                }
                // Reached a terminal state between the listing and the
                // mark; nothing to recover.
                Err(WalletError::InvalidTransition { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(closed)
    }

    /// Resolves a reused idempotency key.
    ///
    /// `Ok(Some(record))` replays a completed transaction, `Ok(None)`
    /// means the key is fresh. A failed terminal record replays its
    /// recorded failure; a still-pending record surfaces `Busy`.
    async fn check_replay(&self, key: &str) -> Result<Option<TransactionRecord>, WalletError> {
        let Some(existing) = self.ledger.find_by_idempotency_key(key).await? else {
            return Ok(None);
        };
        match existing.status {
            TransactionStatus::Completed => {
                debug!(transaction_id = %existing.id, "idempotent replay of completed transfer");
                Ok(Some(existing))
            }
            TransactionStatus::Failed => {
                debug!(transaction_id = %existing.id, "idempotent replay of failed transfer");
                Err(existing
                    .failure_error()
                    .unwrap_or_else(|| WalletError::Store("failed record without code".into())))
            }
            TransactionStatus::Pending => {
                Err(WalletError::Busy(existing.movement.primary_account()))
            }
        }
    }

    /// Records an attempt and runs it to its terminal state.
    ///
    /// Recording and execution are spawned as one task so that a
    /// caller dropping the future cannot strand a `Pending` record;
    /// the task owns clones of the store handles and always finishes.
    async fn run_to_terminal(
        &self,
        record: TransactionRecord,
    ) -> Result<TransactionRecord, WalletError> {
        let engine = self.clone();
        let id = record.id;
        tokio::spawn(async move {
            let record = engine.ledger.record_attempt(record).await?;
            engine.execute(record).await
        })
        .await
        .map_err(|e| {
            error!(transaction_id = %id, error = %e, "transfer task aborted");
            WalletError::Store(format!("transfer task aborted: {e}"))
        })?
    }

    /// Applies the legs of a recorded attempt and marks the outcome.
    async fn execute(&self, record: TransactionRecord) -> Result<TransactionRecord, WalletError> {
        let outcome = match record.movement {
            Movement::Transfer { from, to } => self.execute_transfer(&record, from, to).await,
            Movement::Credit { to } => self.execute_single_leg(&record, to, record.amount).await,
            Movement::Debit { from } => {
                let delta = record
                    .amount
                    .checked_neg()
                    .ok_or_else(|| WalletError::Store("amount negation overflow".into()))?;
                self.execute_single_leg(&record, from, delta).await
            }
        };

        match outcome {
            Ok(completed) => {
                debug!(
                    transaction_id = %completed.id,
                    amount = %completed.amount,
                    "transfer completed"
                );
                Ok(completed)
            }
            Err(e) => {
                warn!(transaction_id = %record.id, error = %e, "transfer failed");
                Err(e)
            }
        }
    }

    /// The two-leg transfer path with compensation.
    async fn execute_transfer(
        &self,
        record: &TransactionRecord,
        from: AccountId,
        to: AccountId,
    ) -> Result<TransactionRecord, WalletError> {
        let debit = record
            .amount
            .checked_neg()
            .ok_or_else(|| WalletError::Store("amount negation overflow".into()))?;

        // Debit leg. Nothing to unwind on failure.
        if let Err(e) = self.adjust_with_retry(from, debit, self.config.max_adjust_attempts).await {
            self.mark_failed_logged(record.id, Self::failure_code(&e, Leg::Debit))
                .await;
            return Err(e);
        }

        // Credit leg. On failure the debit must be reversed before the
        // record goes terminal, otherwise money would vanish.
        match self
            .adjust_with_retry(to, record.amount, self.config.max_adjust_attempts)
            .await
        {
            Ok(_) => self.ledger.mark_completed(record.id).await,
            Err(credit_err) => {
                match self
                    .adjust_with_retry(from, record.amount, self.config.max_compensation_attempts)
                    .await
                {
                    Ok(_) => {
                        debug!(transaction_id = %record.id, "debit leg compensated");
                        self.mark_failed_logged(
                            record.id,
                            Self::failure_code(&credit_err, Leg::Credit),
                        )
                        .await;
                        Err(credit_err)
                    }
                    Err(comp_err) => {
                        // The source wallet is short and we cannot fix
                        // it from here. Escalate loudly.
                        error!(
                            transaction_id = %record.id,
                            account_id = %from,
                            amount = %record.amount,
                            credit_error = %credit_err,
                            compensation_error = %comp_err,
                            "compensation failed; wallet needs manual reconciliation"
                        );
                        self.mark_failed_logged(record.id, FailureCode::CompensationFailed)
                            .await;
                        Err(WalletError::CompensationFailed {
                            id: record.id,
                            account: from,
                        })
                    }
                }
            }
        }
    }

    /// The single-leg path (pure credit or pure debit). No peer leg,
    /// no compensation.
    async fn execute_single_leg(
        &self,
        record: &TransactionRecord,
        account: AccountId,
        delta: Amount,
    ) -> Result<TransactionRecord, WalletError> {
        let leg = if delta.is_negative() {
            Leg::Debit
        } else {
            Leg::Credit
        };
        match self
            .adjust_with_retry(account, delta, self.config.max_adjust_attempts)
            .await
        {
            Ok(_) => self.ledger.mark_completed(record.id).await,
            Err(e) => {
                self.mark_failed_logged(record.id, Self::failure_code(&e, leg))
                    .await;
                Err(e)
            }
        }
    }

    /// Optimistically-concurrent adjustment with bounded, jittered
    /// retry. Re-reads the wallet before every attempt so each retry
    /// observes the latest committed version.
    async fn adjust_with_retry(
        &self,
        account: AccountId,
        delta: Amount,
        max_attempts: u32,
    ) -> Result<Wallet, WalletError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let wallet = self.wallets.get(account).await?;
            match self
                .wallets
                .adjust_balance(account, delta, wallet.version)
                .await
            {
                Ok(updated) => return Ok(updated),
                Err(WalletError::VersionConflict { .. }) if attempt < max_attempts => {
                    let jitter = rand::rng().random_range(0..=self.config.retry_jitter_ms);
                    tokio::time::sleep(Duration::from_millis(jitter)).await;
                }
                Err(WalletError::VersionConflict { .. }) => {
                    return Err(WalletError::Busy(account));
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Marks a record failed; a mark that itself fails is logged, not
    /// propagated, so the original error reaches the caller.
    async fn mark_failed_logged(&self, id: TransactionId, code: FailureCode) {
        if let Err(e) = self.ledger.mark_failed(id, code).await {
            error!(transaction_id = %id, error = %e, "failed to mark transaction failed");
        }
    }

    /// Maps a leg error to the failure code recorded on the ledger.
    fn failure_code(error: &WalletError, leg: Leg) -> FailureCode {
        match (error, leg) {
            (WalletError::InsufficientFunds { .. }, _) => FailureCode::InsufficientFunds,
            (WalletError::NotFound(_), Leg::Debit) => FailureCode::SourceNotFound,
            (WalletError::NotFound(_), Leg::Credit) => FailureCode::DestinationNotFound,
            (WalletError::WalletInactive(_), Leg::Debit) => FailureCode::SourceInactive,
            (WalletError::WalletInactive(_), Leg::Credit) => FailureCode::DestinationInactive,
            (WalletError::Busy(_) | WalletError::VersionConflict { .. }, _) => FailureCode::Busy,
            _ => FailureCode::Store,
        }
    }
}

impl std::fmt::Debug for TransferEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
