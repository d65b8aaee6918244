//! Money movement routes: transfers, deposits, withdrawals.
//!
//! The debit side of a transfer or withdrawal is always the
//! authenticated actor; a request cannot spend another account's
//! balance. Whether an actor is allowed to perform cash-in/cash-out at
//! all is a role gate enforced upstream.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use paygo_core::wallet::{DepositRequest, TransferReason, TransferRequest, WithdrawRequest};
use paygo_shared::types::{AccountId, Amount};
use serde::Deserialize;
use tracing::info;

use super::{TransactionResponse, error_response};
use crate::{AppState, middleware::Actor};

/// Creates the transfer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transfers", post(create_transfer))
        .route("/deposits", post(create_deposit))
        .route("/withdrawals", post(create_withdrawal))
}

/// Request body for a wallet-to-wallet transfer.
#[derive(Debug, Deserialize)]
pub struct CreateTransferRequest {
    /// The credited account.
    pub to_account: AccountId,
    /// Amount in minor units.
    pub amount: Amount,
    /// Replay-protection token; retries must reuse it.
    pub idempotency_key: String,
}

/// Request body for a cash-in deposit.
#[derive(Debug, Deserialize)]
pub struct CreateDepositRequest {
    /// The credited account. Defaults to the actor (an agent names the
    /// customer account it is crediting).
    pub to_account: Option<AccountId>,
    /// Amount in minor units.
    pub amount: Amount,
    /// Optional replay-protection token.
    pub idempotency_key: Option<String>,
}

/// Request body for a cash-out withdrawal.
#[derive(Debug, Deserialize)]
pub struct CreateWithdrawalRequest {
    /// Amount in minor units.
    pub amount: Amount,
    /// Optional replay-protection token.
    pub idempotency_key: Option<String>,
}

/// POST `/transfers` - Move money from the actor's wallet to another.
async fn create_transfer(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreateTransferRequest>,
) -> impl IntoResponse {
    info!(
        from = %actor.account_id,
        to = %payload.to_account,
        amount = %payload.amount,
        "transfer requested"
    );
    let request = TransferRequest {
        from: actor.account_id,
        to: payload.to_account,
        amount: payload.amount,
        reason: TransferReason::Transfer,
        idempotency_key: payload.idempotency_key,
    };
    match state.engine.transfer(request).await {
        Ok(record) => {
            (StatusCode::CREATED, Json(TransactionResponse::from(record))).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// POST `/deposits` - Credit a wallet with cash taken in.
async fn create_deposit(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreateDepositRequest>,
) -> impl IntoResponse {
    let to = payload.to_account.unwrap_or(actor.account_id);
    info!(actor = %actor.account_id, %to, amount = %payload.amount, "deposit requested");
    let request = DepositRequest {
        to,
        amount: payload.amount,
        reason: TransferReason::CashIn,
        idempotency_key: payload.idempotency_key,
    };
    match state.engine.deposit(request).await {
        Ok(record) => {
            (StatusCode::CREATED, Json(TransactionResponse::from(record))).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// POST `/withdrawals` - Debit the actor's wallet for cash paid out.
async fn create_withdrawal(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreateWithdrawalRequest>,
) -> impl IntoResponse {
    info!(from = %actor.account_id, amount = %payload.amount, "withdrawal requested");
    let request = WithdrawRequest {
        from: actor.account_id,
        amount: payload.amount,
        idempotency_key: payload.idempotency_key,
    };
    match state.engine.withdraw(request).await {
        Ok(record) => {
            (StatusCode::CREATED, Json(TransactionResponse::from(record))).into_response()
        }
        Err(e) => error_response(&e),
    }
}
