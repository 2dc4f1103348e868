//! API Integration Tests
//!
//! These tests require:
//! - Running PostgreSQL instance
//! - Environment variables: DATABASE_URL, JWT_SECRET
//!
//! Run with: cargo test -p integration-tests --test api_tests

use integration_tests::{assert_json, assert_status, check_test_env, fixtures::*, TestServer};
use matching_core::{Actor, GatewayError};
use reqwest::StatusCode;
use serde_json::json;

async fn setup() -> Option<(TestServer, Marketplace)> {
    if !check_test_env() {
        return None;
    }
    let server = TestServer::start().await.expect("Failed to start server");
    let market = Marketplace::seed(&server.pool).await.expect("Failed to seed");
    Some((server, market))
}

async fn request(server: &TestServer, market: &Marketplace) -> String {
    let response = server
        .post_as(
            "/api/v1/engagements",
            market.client,
            &json!({ "offerId": market.offer_id.to_string() }),
        )
        .await
        .unwrap();
    let engagement: EngagementBody = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(engagement.status, "REQUESTED");
    engagement.id
}

/// Requested, accepted, estimated with both options, payment session open
async fn prepared(server: &TestServer, market: &Marketplace) -> String {
    let id = request(server, market).await;

    let response = server
        .post_as(
            &format!("/api/v1/engagements/{id}/decision"),
            market.expert,
            &json!({ "outcome": "ACCEPTED" }),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server
        .post_as(
            &format!("/api/v1/engagements/{id}/estimate"),
            market.client,
            &json!({ "optionIds": [market.revision_option.to_string(), market.source_option.to_string()] }),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::CREATED).await.unwrap();

    let response = server
        .post_empty_as(&format!("/api/v1/engagements/{id}/payments"), market.client)
        .await
        .unwrap();
    let prepared: PrepareBody = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert!(!prepared.redirect_url.is_empty());
    id
}

async fn approve(server: &TestServer, id: &str) -> SettlementBody {
    let response = server
        .get(&format!(
            "/api/v1/payments/callback/approve?engagement_id={id}&pg_token=token-{id}"
        ))
        .await
        .unwrap();
    assert_json(response, StatusCode::OK).await.unwrap()
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let Some((server, _)) = setup().await else {
        return;
    };

    let response = server.get("/health").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server.get("/health/ready").await.expect("Request failed");
    let body: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["checks"]["database"], "healthy");
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_engagement_lifecycle_to_review() {
    let Some((server, market)) = setup().await else {
        return;
    };
    let id = prepared(&server, &market).await;

    let response = server
        .get_as(&format!("/api/v1/engagements/{id}/estimate"), market.expert)
        .await
        .unwrap();
    let estimate: EstimateBody = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(estimate.base_price, BASE_PRICE);
    assert_eq!(estimate.total, BASE_PRICE + REVISION_PRICE + SOURCE_PRICE);
    assert_eq!(estimate.options.len(), 2);
    assert_eq!(estimate.options[0].name, "Extra revision");
    assert_eq!(estimate.options[0].option_id, market.revision_option.to_string());
    assert_eq!(estimate.options[1].price, SOURCE_PRICE);

    let settled = approve(&server, &id).await;
    assert_eq!(settled.outcome, "SETTLED");
    assert_eq!(settled.payment.status, "PAID");
    assert_eq!(settled.payment.cost, 150_000);
    assert_eq!(settled.engagement_status, "ACCEPTED");

    let response = server
        .post_empty_as(&format!("/api/v1/engagements/{id}/start"), market.expert)
        .await
        .unwrap();
    let started: EngagementBody = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(started.status, "IN_PROGRESS");
    assert!(started.work_started_at.is_some());

    let response = server
        .post_empty_as(&format!("/api/v1/engagements/{id}/complete"), market.expert)
        .await
        .unwrap();
    let completed: EngagementBody = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(completed.work_ended_at.is_some());

    let response = server
        .post_empty_as(&format!("/api/v1/engagements/{id}/confirm"), market.client)
        .await
        .unwrap();
    let confirmed: EngagementBody = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(confirmed.status, "CONFIRMED");

    let response = server
        .post_as(
            &format!("/api/v1/engagements/{id}/reviews"),
            market.client,
            &json!({ "score": 5, "content": "Excellent" }),
        )
        .await
        .unwrap();
    let review: ReviewBody = assert_json(response, StatusCode::CREATED).await.unwrap();

    let rating_path = format!("/api/v1/experts/{}/rating", market.expert.id);
    let rating: RatingBody = assert_json(server.get(&rating_path).await.unwrap(), StatusCode::OK)
        .await
        .unwrap();
    assert!((rating.rating - 5.0).abs() < f64::EPSILON);
    assert_eq!(rating.review_count, 1);

    let response = server
        .delete_as(&format!("/api/v1/reviews/{}", review.id), market.client)
        .await
        .unwrap();
    assert_status(response, StatusCode::NO_CONTENT).await.unwrap();

    let rating: RatingBody = assert_json(server.get(&rating_path).await.unwrap(), StatusCode::OK)
        .await
        .unwrap();
    assert_eq!(rating.review_count, 0);
    assert!(rating.rating.abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_duplicate_request_conflicts() {
    let Some((server, market)) = setup().await else {
        return;
    };
    request(&server, &market).await;

    let response = server
        .post_as(
            "/api/v1/engagements",
            market.client,
            &json!({ "offerId": market.offer_id.to_string() }),
        )
        .await
        .unwrap();
    let body: ErrorBody = assert_json(response, StatusCode::CONFLICT).await.unwrap();
    assert_eq!(body.error.code, "DUPLICATE_REQUEST");
}

#[tokio::test]
async fn test_invalid_transition_is_409() {
    let Some((server, market)) = setup().await else {
        return;
    };
    let id = request(&server, &market).await;

    let response = server
        .post_empty_as(&format!("/api/v1/engagements/{id}/complete"), market.expert)
        .await
        .unwrap();
    let body: ErrorBody = assert_json(response, StatusCode::CONFLICT).await.unwrap();
    assert_eq!(body.error.code, "INVALID_STATE_TRANSITION");
    assert!(!body.error.message.is_empty());
}

// ============================================================================
// Settlement Tests
// ============================================================================

#[tokio::test]
async fn test_second_approval_settles_nothing() {
    let Some((server, market)) = setup().await else {
        return;
    };
    let id = prepared(&server, &market).await;

    let first = approve(&server, &id).await;
    let second = approve(&server, &id).await;
    assert_eq!(first.outcome, "SETTLED");
    assert_eq!(second.outcome, "ALREADY_SETTLED");
    assert_eq!(second.payment.id, first.payment.id);
    assert_eq!(server.gateway.approve_calls().await.len(), 1);
}

#[tokio::test]
async fn test_cancel_after_payment_refunds_in_full() {
    let Some((server, market)) = setup().await else {
        return;
    };
    let id = prepared(&server, &market).await;
    approve(&server, &id).await;

    let response = server
        .post_as(
            &format!("/api/v1/engagements/{id}/cancel"),
            market.client,
            &json!({ "reason": "Plans changed" }),
        )
        .await
        .unwrap();
    let cancelled: EngagementBody = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(cancelled.status, "CANCELLED");
    assert_eq!(cancelled.cancel_reason.as_deref(), Some("Plans changed"));

    let refunds = server.gateway.cancel_calls().await;
    assert_eq!(refunds.len(), 1);
    assert_eq!(refunds[0].amount.amount(), 150_000);

    // cancelled is terminal
    let response = server
        .post_as(
            &format!("/api/v1/engagements/{id}/cancel"),
            market.client,
            &json!({ "reason": "Again" }),
        )
        .await
        .unwrap();
    assert!(response.status().is_success() || response.status() == StatusCode::CONFLICT);
    assert_eq!(server.gateway.cancel_calls().await.len(), 1);
}

#[tokio::test]
async fn test_abandoned_session_can_be_reopened() {
    let Some((server, market)) = setup().await else {
        return;
    };
    let id = prepared(&server, &market).await;

    let response = server
        .get(&format!("/api/v1/payments/callback/cancel?engagement_id={id}"))
        .await
        .unwrap();
    let payment: PaymentBody = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(payment.status, "CANCELLED");

    let response = server
        .get_as(&format!("/api/v1/engagements/{id}"), market.client)
        .await
        .unwrap();
    let engagement: EngagementBody = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(engagement.status, "ACCEPTED");

    let response = server
        .post_empty_as(&format!("/api/v1/engagements/{id}/payments"), market.client)
        .await
        .unwrap();
    let reopened: PrepareBody = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_ne!(reopened.payment_id, payment.id);
}

#[tokio::test]
async fn test_gateway_outage_leaves_no_payment() {
    let Some((server, market)) = setup().await else {
        return;
    };
    let id = request(&server, &market).await;
    let response = server
        .post_as(
            &format!("/api/v1/engagements/{id}/estimate"),
            market.client,
            &json!({ "optionIds": [] }),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::CREATED).await.unwrap();

    server
        .gateway
        .script_ready(Err(GatewayError::Unavailable(503)))
        .await;
    let response = server
        .post_empty_as(&format!("/api/v1/engagements/{id}/payments"), market.client)
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_GATEWAY).await.unwrap();

    // nothing to approve
    let response = server
        .get(&format!("/api/v1/payments/callback/approve?engagement_id={id}&pg_token=t"))
        .await
        .unwrap();
    assert_status(response, StatusCode::NOT_FOUND).await.unwrap();
}

// ============================================================================
// Authorization Tests
// ============================================================================

#[tokio::test]
async fn test_authorization_rules() {
    let Some((server, market)) = setup().await else {
        return;
    };

    let response = server
        .client
        .post(format!("{}/api/v1/engagements", server.base_url()))
        .json(&json!({ "offerId": market.offer_id.to_string() }))
        .send()
        .await
        .unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();

    let response = server
        .post_as(
            "/api/v1/engagements",
            market.expert,
            &json!({ "offerId": market.offer_id.to_string() }),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::FORBIDDEN).await.unwrap();

    let id = request(&server, &market).await;
    let stranger = Actor::client(unique_id());
    let response = server
        .get_as(&format!("/api/v1/engagements/{id}"), stranger)
        .await
        .unwrap();
    let body: ErrorBody = assert_json(response, StatusCode::FORBIDDEN).await.unwrap();
    assert_eq!(body.error.code, "NOT_ENGAGEMENT_PARTY");

    let response = server
        .post_empty_as(&format!("/api/v1/engagements/{id}/start"), market.client)
        .await
        .unwrap();
    assert_status(response, StatusCode::FORBIDDEN).await.unwrap();
}

#[tokio::test]
async fn test_review_rules() {
    let Some((server, market)) = setup().await else {
        return;
    };
    let id = request(&server, &market).await;

    let response = server
        .post_as(
            &format!("/api/v1/engagements/{id}/reviews"),
            market.client,
            &json!({ "score": 4 }),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::CONFLICT).await.unwrap();

    let response = server
        .post_as(
            &format!("/api/v1/engagements/{id}/reviews"),
            market.client,
            &json!({ "score": 9 }),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}
