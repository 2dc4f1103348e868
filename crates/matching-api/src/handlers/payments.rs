//! Payment handlers
//!
//! `prepare` is called by the client. The three callbacks are the
//! gateway's browser redirects and carry no token; they only ever act on
//! the latest payment of the named engagement.

use axum::{extract::State, Json};
use matching_core::Snowflake;
use matching_service::dto::{
    ApproveCallbackQuery, CallbackQuery, PaymentResponse, PreparePaymentResponse, SettlementResponse,
};
use matching_service::SettlementService;

use crate::extractors::{AuthUser, CallbackParams, SnowflakePath};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// Open a gateway session for the estimate
///
/// POST /engagements/{engagement_id}/payments
pub async fn prepare_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    SnowflakePath(engagement_id): SnowflakePath<Snowflake>,
) -> ApiResult<Created<Json<PreparePaymentResponse>>> {
    let service = SettlementService::new(state.service_context());
    let response = service.prepare(engagement_id, &auth.actor).await?;
    Ok(Created(Json(response)))
}

/// GET /payments/callback/approve?engagement_id=..&pg_token=..
pub async fn approve_callback(
    State(state): State<AppState>,
    CallbackParams(query): CallbackParams<ApproveCallbackQuery>,
) -> ApiResult<Json<SettlementResponse>> {
    let service = SettlementService::new(state.service_context());
    let result = service.approve(query.engagement_id, &query.pg_token).await?;
    Ok(Json(SettlementResponse::from(result)))
}

/// GET /payments/callback/cancel?engagement_id=..
pub async fn cancel_callback(
    State(state): State<AppState>,
    CallbackParams(query): CallbackParams<CallbackQuery>,
) -> ApiResult<Json<PaymentResponse>> {
    let service = SettlementService::new(state.service_context());
    Ok(Json(service.abandon(query.engagement_id).await?))
}

/// GET /payments/callback/fail?engagement_id=..
pub async fn fail_callback(
    State(state): State<AppState>,
    CallbackParams(query): CallbackParams<CallbackQuery>,
) -> ApiResult<Json<PaymentResponse>> {
    let service = SettlementService::new(state.service_context());
    Ok(Json(service.fail(query.engagement_id).await?))
}
