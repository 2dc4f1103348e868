//! Route definitions
//!
//! All API routes organized by domain and mounted under /api/v1.

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers::{engagements, estimates, health, payments, reviews};
use crate::state::AppState;

/// Create the main API router (health routes are separate so they skip rate limiting)
pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes())
}

/// Health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(engagement_routes())
        .merge(payment_routes())
        .merge(review_routes())
}

/// Engagement lifecycle and its estimate
fn engagement_routes() -> Router<AppState> {
    Router::new()
        .route("/engagements", post(engagements::request_engagement))
        .route("/engagements/:engagement_id", get(engagements::get_engagement))
        .route("/engagements/:engagement_id/decision", post(engagements::decide))
        .route("/engagements/:engagement_id/start", post(engagements::start_work))
        .route("/engagements/:engagement_id/complete", post(engagements::complete_work))
        .route("/engagements/:engagement_id/confirm", post(engagements::confirm))
        .route("/engagements/:engagement_id/cancel", post(engagements::cancel))
        .route(
            "/engagements/:engagement_id/estimate",
            post(estimates::build_estimate).get(estimates::get_estimate),
        )
}

/// Payment sessions and the gateway's browser redirects
fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/engagements/:engagement_id/payments", post(payments::prepare_payment))
        .route("/payments/callback/approve", get(payments::approve_callback))
        .route("/payments/callback/cancel", get(payments::cancel_callback))
        .route("/payments/callback/fail", get(payments::fail_callback))
}

fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/engagements/:engagement_id/reviews", post(reviews::create_review))
        .route("/reviews/:review_id", delete(reviews::delete_review))
        .route("/experts/:expert_id/rating", get(reviews::get_expert_rating))
}
