//! Wallet routes: provisioning, balance reads, history, freezing.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use paygo_shared::types::{AccountId, PageRequest, PageResponse, TransactionId};
use serde::Deserialize;
use tracing::info;

use super::{TransactionResponse, WalletResponse, error_response};
use crate::{AppState, middleware::Actor};

/// Creates the wallet routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallets", post(provision_wallet))
        .route("/wallets/{account_id}", get(get_wallet))
        .route("/wallets/{account_id}/transactions", get(list_transactions))
        .route("/wallets/{account_id}/freeze", post(freeze_wallet))
        .route("/wallets/{account_id}/unfreeze", post(unfreeze_wallet))
        .route("/transactions/{transaction_id}", get(get_transaction))
}

/// Request body for provisioning a wallet.
#[derive(Debug, Deserialize)]
pub struct ProvisionWalletRequest {
    /// The account to provision a wallet for.
    pub account_id: AccountId,
}

/// POST `/wallets` - Provision a wallet for an account.
///
/// Called by account-creation orchestration as an explicit step; safe
/// to retry.
async fn provision_wallet(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<ProvisionWalletRequest>,
) -> impl IntoResponse {
    info!(actor = %actor.account_id, account_id = %payload.account_id, "provisioning wallet");
    match state.engine.provision_wallet(payload.account_id).await {
        Ok(wallet) => {
            (StatusCode::CREATED, Json(WalletResponse::from(wallet))).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// GET `/wallets/{account_id}` - Current balance and status.
async fn get_wallet(
    State(state): State<AppState>,
    _actor: Actor,
    Path(account_id): Path<AccountId>,
) -> impl IntoResponse {
    match state.engine.get_wallet(account_id).await {
        Ok(wallet) => Json(WalletResponse::from(wallet)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET `/wallets/{account_id}/transactions` - Paginated history,
/// newest first.
async fn list_transactions(
    State(state): State<AppState>,
    _actor: Actor,
    Path(account_id): Path<AccountId>,
    Query(page): Query<PageRequest>,
) -> impl IntoResponse {
    match state.engine.history(account_id, &page).await {
        Ok(history) => {
            let data = history
                .data
                .into_iter()
                .map(TransactionResponse::from)
                .collect();
            Json(PageResponse {
                data,
                meta: history.meta,
            })
            .into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// GET `/transactions/{transaction_id}` - Audit lookup of one record.
async fn get_transaction(
    State(state): State<AppState>,
    _actor: Actor,
    Path(transaction_id): Path<TransactionId>,
) -> impl IntoResponse {
    match state.engine.find_transaction(transaction_id).await {
        Ok(Some(record)) => Json(TransactionResponse::from(record)).into_response(),
        Ok(None) => error_response(&paygo_core::wallet::WalletError::TransactionNotFound(
            transaction_id,
        )),
        Err(e) => error_response(&e),
    }
}

/// POST `/wallets/{account_id}/freeze` - Freeze the wallet.
async fn freeze_wallet(
    State(state): State<AppState>,
    actor: Actor,
    Path(account_id): Path<AccountId>,
) -> impl IntoResponse {
    info!(actor = %actor.account_id, %account_id, "freeze requested");
    match state.engine.freeze(account_id).await {
        Ok(wallet) => Json(WalletResponse::from(wallet)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST `/wallets/{account_id}/unfreeze` - Unfreeze the wallet.
async fn unfreeze_wallet(
    State(state): State<AppState>,
    actor: Actor,
    Path(account_id): Path<AccountId>,
) -> impl IntoResponse {
    info!(actor = %actor.account_id, %account_id, "unfreeze requested");
    match state.engine.unfreeze(account_id).await {
        Ok(wallet) => Json(WalletResponse::from(wallet)).into_response(),
        Err(e) => error_response(&e),
    }
}
