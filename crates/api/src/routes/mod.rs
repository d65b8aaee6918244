//! API route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use paygo_core::wallet::{
    FailureCode, TransactionRecord, TransactionStatus, TransferReason, Wallet, WalletError,
};
use paygo_shared::types::{AccountId, Amount, TransactionId};
use serde::Serialize;
use serde_json::json;

use crate::{AppState, middleware::auth::actor_middleware};

pub mod health;
pub mod transfers;
pub mod wallets;

/// Creates the API router: public health plus actor-protected wallet
/// and transfer routes.
pub fn api_routes() -> Router<AppState> {
    let protected = Router::new()
        .merge(wallets::routes())
        .merge(transfers::routes())
        .layer(middleware::from_fn(actor_middleware));

    Router::new().merge(health::routes()).merge(protected)
}

/// Maps a wallet error to the standard error response shape.
pub(crate) fn error_response(err: &WalletError) -> Response {
    let status = StatusCode::from_u16(err.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(error = %err, "wallet operation failed");
    }
    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}

/// Response body for a wallet.
#[derive(Debug, Serialize)]
pub struct WalletResponse {
    /// The owning account.
    pub account_id: AccountId,
    /// Current balance in minor units.
    pub balance: Amount,
    /// Whether the wallet accepts debits and credits.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl From<Wallet> for WalletResponse {
    fn from(wallet: Wallet) -> Self {
        Self {
            account_id: wallet.account_id,
            balance: wallet.balance,
            is_active: wallet.is_active,
            created_at: wallet.created_at,
            updated_at: wallet.updated_at,
        }
    }
}

/// Response body for a transaction record.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction id.
    pub id: TransactionId,
    /// Debited account, if any.
    pub from_account: Option<AccountId>,
    /// Credited account, if any.
    pub to_account: Option<AccountId>,
    /// Amount in minor units.
    pub amount: Amount,
    /// Current status.
    pub status: TransactionStatus,
    /// Reporting classification.
    pub reason: TransferReason,
    /// Failure reason for failed records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_code: Option<FailureCode>,
    /// The transaction this record reverses, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reversal_of: Option<TransactionId>,
    /// When the attempt was recorded.
    pub created_at: DateTime<Utc>,
    /// When the record went terminal.
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<TransactionRecord> for TransactionResponse {
    fn from(record: TransactionRecord) -> Self {
        Self {
            id: record.id,
            from_account: record.movement.from_account(),
            to_account: record.movement.to_account(),
            amount: record.amount,
            status: record.status,
            reason: record.reason,
            failure_code: record.failure_code,
            reversal_of: record.reversal_of,
            created_at: record.created_at,
            completed_at: record.completed_at,
        }
    }
}
