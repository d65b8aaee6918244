//! Router tests over an in-memory engine.
//!
//! Exercises the HTTP surface end to end without a database: actor
//! middleware, wallet provisioning, transfers, and error mapping.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use paygo_api::{AppState, create_router};
use paygo_core::wallet::{MemoryLedger, MemoryWalletStore, TransferEngine, WalletStore};
use paygo_shared::config::WalletConfig;
use paygo_shared::types::{AccountId, Amount};
use serde_json::{Value, json};
use tower::util::ServiceExt;

struct TestApp {
    router: Router,
    wallets: Arc<MemoryWalletStore>,
}

fn test_app() -> TestApp {
    let wallets = Arc::new(MemoryWalletStore::new());
    let ledger = Arc::new(MemoryLedger::new());
    let config = WalletConfig {
        retry_jitter_ms: 0,
        ..WalletConfig::default()
    };
    let engine = Arc::new(TransferEngine::new(wallets.clone(), ledger, config));
    let router = create_router(AppState { engine });
    TestApp { router, wallets }
}

fn request(method: &str, uri: &str, actor: Option<AccountId>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder
            .header("x-actor-id", actor.to_string())
            .header("x-actor-role", "user");
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = test_app();
    let response = app
        .router
        .oneshot(request("GET", "/api/v1/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_wallet_routes_require_actor_identity() {
    let app = test_app();
    let account = AccountId::new();

    let response = app
        .router
        .oneshot(request(
            "GET",
            &format!("/api/v1/wallets/{account}"),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(response).await;
    assert_eq!(body["error"], "missing_actor");
}

#[tokio::test]
async fn test_provision_then_read_wallet() {
    let app = test_app();
    let actor = AccountId::new();
    let account = AccountId::new();

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/wallets",
            Some(actor),
            Some(json!({ "account_id": account })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["account_id"], account.to_string());
    assert_eq!(body["balance"], 50);
    assert_eq!(body["is_active"], true);

    let response = app
        .router
        .oneshot(request(
            "GET",
            &format!("/api/v1/wallets/{account}"),
            Some(actor),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["balance"], 50);
}

#[tokio::test]
async fn test_unknown_wallet_maps_to_404() {
    let app = test_app();
    let actor = AccountId::new();

    let response = app
        .router
        .oneshot(request(
            "GET",
            &format!("/api/v1/wallets/{}", AccountId::new()),
            Some(actor),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"], "WALLET_NOT_FOUND");
}

#[tokio::test]
async fn test_transfer_moves_money_and_lists_in_history() {
    let app = test_app();
    let actor = AccountId::new();
    let peer = AccountId::new();
    app.wallets
        .create_wallet(actor, Amount::from_minor_units(100))
        .await
        .unwrap();
    app.wallets
        .create_wallet(peer, Amount::from_minor_units(0))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/transfers",
            Some(actor),
            Some(json!({
                "to_account": peer,
                "amount": 40,
                "idempotency_key": "http-t1"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["amount"], 40);
    assert_eq!(body["from_account"], actor.to_string());
    assert_eq!(body["to_account"], peer.to_string());

    let response = app
        .router
        .oneshot(request(
            "GET",
            &format!("/api/v1/wallets/{peer}/transactions?page=1&per_page=10"),
            Some(actor),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["reason"], "transfer");
}

#[tokio::test]
async fn test_insufficient_funds_maps_to_422() {
    let app = test_app();
    let actor = AccountId::new();
    let peer = AccountId::new();
    app.wallets
        .create_wallet(actor, Amount::from_minor_units(10))
        .await
        .unwrap();
    app.wallets
        .create_wallet(peer, Amount::from_minor_units(0))
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/v1/transfers",
            Some(actor),
            Some(json!({
                "to_account": peer,
                "amount": 50,
                "idempotency_key": "http-t2"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["error"], "INSUFFICIENT_FUNDS");
}

#[tokio::test]
async fn test_zero_amount_maps_to_400() {
    let app = test_app();
    let actor = AccountId::new();
    app.wallets
        .create_wallet(actor, Amount::from_minor_units(10))
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/v1/transfers",
            Some(actor),
            Some(json!({
                "to_account": AccountId::new(),
                "amount": 0,
                "idempotency_key": "http-t3"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "INVALID_AMOUNT");
}

#[tokio::test]
async fn test_deposit_and_withdrawal_round() {
    let app = test_app();
    let actor = AccountId::new();
    app.wallets
        .create_wallet(actor, Amount::from_minor_units(0))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/deposits",
            Some(actor),
            Some(json!({ "amount": 80, "idempotency_key": "http-d1" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["reason"], "cash_in");
    assert_eq!(body["to_account"], actor.to_string());
    assert!(body["from_account"].is_null());

    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/v1/withdrawals",
            Some(actor),
            Some(json!({ "amount": 30, "idempotency_key": "http-w1" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["reason"], "cash_out");

    let wallet = app.wallets.get(actor).await.unwrap();
    assert_eq!(wallet.balance, Amount::from_minor_units(50));
}

#[tokio::test]
async fn test_freeze_blocks_movement_until_unfrozen() {
    let app = test_app();
    let actor = AccountId::new();
    app.wallets
        .create_wallet(actor, Amount::from_minor_units(100))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/wallets/{actor}/freeze"),
            Some(actor),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["is_active"], false);

    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/v1/withdrawals",
            Some(actor),
            Some(json!({ "amount": 10 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["error"], "WALLET_INACTIVE");
}
