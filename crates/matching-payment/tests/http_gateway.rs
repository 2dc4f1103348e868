//! HttpPaymentGateway against a throw-away local gateway

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use matching_common::PaymentConfig;
use matching_core::{
    ApproveRequest, CancelRequest, GatewayError, GatewayPaymentState, Money, PaymentGateway,
    ReadyRequest, Snowflake,
};
use matching_payment::HttpPaymentGateway;

/// (path, authorization, idempotency key, body) of every request received
type Seen = Arc<Mutex<Vec<(String, Option<String>, Option<String>, Value)>>>;

async fn record(seen: &Seen, path: &str, headers: &HeaderMap, body: Value) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    seen.lock().await.push((
        path.to_string(),
        header("authorization"),
        header("idempotency-key"),
        body,
    ));
}

async fn ready(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    record(&seen, "/payment/ready", &headers, body).await;
    Json(json!({"transactionId": "T100", "redirectUrl": "https://pg.test/pay/T100"}))
}

async fn approve(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    record(&seen, "/payment/approve", &headers, body).await;
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"code": "INVALID_TOKEN", "message": "approval token expired"})),
    )
}

async fn cancel(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    record(&seen, "/payment/cancel", &headers, body).await;
    StatusCode::SERVICE_UNAVAILABLE
}

async fn order(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    let slow = body["transactionId"] == "SLOW";
    let garbled = body["transactionId"] == "GARBLED";
    record(&seen, "/payment/order", &headers, body).await;
    if slow {
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
    if garbled {
        return Json(json!({"unexpected": true}));
    }
    Json(json!({"transactionId": "T100", "status": "APPROVED"}))
}

/// Start the fake gateway and return a client pointed at it
async fn start() -> (HttpPaymentGateway, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/v1/payment/ready", post(ready))
        .route("/v1/payment/approve", post(approve))
        .route("/v1/payment/cancel", post(cancel))
        .route("/v1/payment/order", post(order))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let gateway = HttpPaymentGateway::new(&PaymentConfig {
        base_url: format!("http://{addr}/v1"),
        merchant_id: "M-TEST".to_string(),
        secret_key: "sk-test".to_string(),
        timeout_secs: 1,
        callback_base_url: "http://localhost:8080".to_string(),
    })
    .unwrap();

    (gateway, seen)
}

#[tokio::test]
async fn test_ready_sends_session_request() {
    let (gateway, seen) = start().await;

    let session = gateway
        .ready(&ReadyRequest {
            order_id: Snowflake::new(10),
            payer_id: Snowflake::new(20),
            item_name: "Brand identity".to_string(),
            amount: Money::new(150_000).unwrap(),
            approval_url: "http://localhost:8080/approve".to_string(),
            cancel_url: "http://localhost:8080/cancel".to_string(),
            fail_url: "http://localhost:8080/fail".to_string(),
            idempotency_key: "77:ready".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(session.transaction_id, "T100");
    assert_eq!(session.redirect_url, "https://pg.test/pay/T100");

    let seen = seen.lock().await;
    let (path, auth, key, body) = &seen[0];
    assert_eq!(path, "/payment/ready");
    assert_eq!(auth.as_deref(), Some("SECRET_KEY sk-test"));
    assert_eq!(key.as_deref(), Some("77:ready"));
    assert_eq!(body["merchantId"], "M-TEST");
    assert_eq!(body["orderId"], "10");
    assert_eq!(body["amount"], 150_000);
    assert_eq!(body["itemName"], "Brand identity");
}

#[tokio::test]
async fn test_client_error_is_rejected_with_gateway_code() {
    let (gateway, _) = start().await;

    let err = gateway
        .approve(&ApproveRequest {
            transaction_id: "T100".to_string(),
            order_id: Snowflake::new(10),
            payer_id: Snowflake::new(20),
            approval_token: "pg-token".to_string(),
            idempotency_key: "77:approve".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GatewayError::Rejected {
            status: 400,
            code: "INVALID_TOKEN".to_string(),
            message: "approval token expired".to_string(),
        }
    );
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let (gateway, seen) = start().await;

    let err = gateway
        .cancel(&CancelRequest {
            transaction_id: "T100".to_string(),
            amount: Money::new(150_000).unwrap(),
            reason: "client cancelled".to_string(),
            idempotency_key: "77:cancel".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err, GatewayError::Unavailable(503));
    let seen = seen.lock().await;
    assert_eq!(seen[0].3["cancelAmount"], 150_000);
    assert_eq!(seen[0].2.as_deref(), Some("77:cancel"));
}

#[tokio::test]
async fn test_inquire_maps_status() {
    let (gateway, _) = start().await;
    assert_eq!(
        gateway.inquire("T100").await.unwrap(),
        GatewayPaymentState::Approved
    );
}

#[tokio::test]
async fn test_slow_gateway_times_out() {
    let (gateway, _) = start().await;
    assert_eq!(gateway.inquire("SLOW").await.unwrap_err(), GatewayError::Timeout);
}

#[tokio::test]
async fn test_undecodable_reply_is_invalid_response() {
    let (gateway, _) = start().await;
    assert!(matches!(
        gateway.inquire("GARBLED").await.unwrap_err(),
        GatewayError::InvalidResponse(_)
    ));
}

#[tokio::test]
async fn test_unreachable_gateway_is_transport_error() {
    let gateway = HttpPaymentGateway::new(&PaymentConfig {
        // port 9 (discard) is closed on test machines
        base_url: "http://127.0.0.1:9".to_string(),
        merchant_id: "M".to_string(),
        secret_key: "k".to_string(),
        timeout_secs: 1,
        callback_base_url: "http://localhost:8080".to_string(),
    })
    .unwrap();

    let err = gateway.inquire("T1").await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_) | GatewayError::Timeout));
}
