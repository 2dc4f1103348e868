//! Estimate handlers

use axum::{extract::State, Json};
use matching_core::Snowflake;
use matching_service::dto::{BuildEstimateRequest, EstimateResponse};
use matching_service::EstimateService;

use crate::extractors::{AuthUser, SnowflakePath, ValidatedJson};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// Freeze the offer's prices for the selected options
///
/// POST /engagements/{engagement_id}/estimate
pub async fn build_estimate(
    State(state): State<AppState>,
    auth: AuthUser,
    SnowflakePath(engagement_id): SnowflakePath<Snowflake>,
    ValidatedJson(request): ValidatedJson<BuildEstimateRequest>,
) -> ApiResult<Created<Json<EstimateResponse>>> {
    let service = EstimateService::new(state.service_context());
    let response = service.build(engagement_id, &auth.actor, request).await?;
    Ok(Created(Json(response)))
}

/// GET /engagements/{engagement_id}/estimate
pub async fn get_estimate(
    State(state): State<AppState>,
    auth: AuthUser,
    SnowflakePath(engagement_id): SnowflakePath<Snowflake>,
) -> ApiResult<Json<EstimateResponse>> {
    let service = EstimateService::new(state.service_context());
    Ok(Json(service.get(engagement_id, &auth.actor).await?))
}
