//! Engagement handlers
//!
//! Requesting an offer and driving the engagement through its lifecycle.

use axum::{extract::State, Json};
use matching_core::Snowflake;
use matching_service::dto::{
    CancelEngagementRequest, CreateEngagementRequest, DecisionRequest, EngagementResponse,
};
use matching_service::MatchingService;

use crate::extractors::{AuthUser, SnowflakePath, ValidatedJson};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// Request an offer
///
/// POST /engagements
pub async fn request_engagement(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateEngagementRequest>,
) -> ApiResult<Created<Json<EngagementResponse>>> {
    let service = MatchingService::new(state.service_context());
    let response = service.request(&auth.actor, request).await?;
    Ok(Created(Json(response)))
}

/// GET /engagements/{engagement_id}
pub async fn get_engagement(
    State(state): State<AppState>,
    auth: AuthUser,
    SnowflakePath(engagement_id): SnowflakePath<Snowflake>,
) -> ApiResult<Json<EngagementResponse>> {
    let service = MatchingService::new(state.service_context());
    Ok(Json(service.get(engagement_id, &auth.actor).await?))
}

/// Expert accepts or rejects
///
/// POST /engagements/{engagement_id}/decision
pub async fn decide(
    State(state): State<AppState>,
    auth: AuthUser,
    SnowflakePath(engagement_id): SnowflakePath<Snowflake>,
    ValidatedJson(request): ValidatedJson<DecisionRequest>,
) -> ApiResult<Json<EngagementResponse>> {
    let service = MatchingService::new(state.service_context());
    let response = service
        .decide(engagement_id, &auth.actor, request.outcome)
        .await?;
    Ok(Json(response))
}

/// POST /engagements/{engagement_id}/start
pub async fn start_work(
    State(state): State<AppState>,
    auth: AuthUser,
    SnowflakePath(engagement_id): SnowflakePath<Snowflake>,
) -> ApiResult<Json<EngagementResponse>> {
    let service = MatchingService::new(state.service_context());
    Ok(Json(service.start_work(engagement_id, &auth.actor).await?))
}

/// POST /engagements/{engagement_id}/complete
pub async fn complete_work(
    State(state): State<AppState>,
    auth: AuthUser,
    SnowflakePath(engagement_id): SnowflakePath<Snowflake>,
) -> ApiResult<Json<EngagementResponse>> {
    let service = MatchingService::new(state.service_context());
    Ok(Json(service.complete_work(engagement_id, &auth.actor).await?))
}

/// POST /engagements/{engagement_id}/confirm
pub async fn confirm(
    State(state): State<AppState>,
    auth: AuthUser,
    SnowflakePath(engagement_id): SnowflakePath<Snowflake>,
) -> ApiResult<Json<EngagementResponse>> {
    let service = MatchingService::new(state.service_context());
    Ok(Json(service.confirm(engagement_id, &auth.actor).await?))
}

/// Cancel, refunding a captured payment
///
/// POST /engagements/{engagement_id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    auth: AuthUser,
    SnowflakePath(engagement_id): SnowflakePath<Snowflake>,
    ValidatedJson(request): ValidatedJson<CancelEngagementRequest>,
) -> ApiResult<Json<EngagementResponse>> {
    let service = MatchingService::new(state.service_context());
    let response = service
        .cancel(engagement_id, &auth.actor, request.reason)
        .await?;
    Ok(Json(response))
}
