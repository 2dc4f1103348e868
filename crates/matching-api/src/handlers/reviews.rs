//! Review handlers

use axum::{extract::State, Json};
use matching_core::Snowflake;
use matching_service::dto::{CreateReviewRequest, ExpertRatingResponse, ReviewResponse};
use matching_service::ReviewService;

use crate::extractors::{AuthUser, SnowflakePath, ValidatedJson};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// Review a confirmed engagement
///
/// POST /engagements/{engagement_id}/reviews
pub async fn create_review(
    State(state): State<AppState>,
    auth: AuthUser,
    SnowflakePath(engagement_id): SnowflakePath<Snowflake>,
    ValidatedJson(request): ValidatedJson<CreateReviewRequest>,
) -> ApiResult<Created<Json<ReviewResponse>>> {
    let service = ReviewService::new(state.service_context());
    let response = service.create(engagement_id, &auth.actor, request).await?;
    Ok(Created(Json(response)))
}

/// DELETE /reviews/{review_id}
pub async fn delete_review(
    State(state): State<AppState>,
    auth: AuthUser,
    SnowflakePath(review_id): SnowflakePath<Snowflake>,
) -> ApiResult<NoContent> {
    let service = ReviewService::new(state.service_context());
    service.delete(review_id, &auth.actor).await?;
    Ok(NoContent)
}

/// Public rating; no token required
///
/// GET /experts/{expert_id}/rating
pub async fn get_expert_rating(
    State(state): State<AppState>,
    SnowflakePath(expert_id): SnowflakePath<Snowflake>,
) -> ApiResult<Json<ExpertRatingResponse>> {
    let service = ReviewService::new(state.service_context());
    Ok(Json(service.expert_rating(expert_id).await?))
}
