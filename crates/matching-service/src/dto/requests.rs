//! Request DTOs for API endpoints
//!
//! JSON bodies are camelCase. Ids are accepted as strings or numbers.

use matching_core::{Decision, Snowflake};
use serde::Deserialize;
use validator::Validate;

// ============================================================================
// Engagement Requests
// ============================================================================

/// Request an offer
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEngagementRequest {
    pub offer_id: Snowflake,
}

/// Expert's answer to a request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DecisionRequest {
    pub outcome: Decision,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CancelEngagementRequest {
    #[validate(length(min = 1, max = 500, message = "Reason must be 1-500 characters"))]
    pub reason: String,
}

// ============================================================================
// Estimate Requests
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BuildEstimateRequest {
    #[validate(length(max = 100, message = "At most 100 options may be selected"))]
    #[serde(default)]
    pub option_ids: Vec<Snowflake>,
}

// ============================================================================
// Review Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(range(min = 0, max = 5, message = "Score must be between 0 and 5"))]
    pub score: i32,

    #[validate(length(max = 2000, message = "Content must be at most 2000 characters"))]
    #[serde(default)]
    pub content: String,
}

// ============================================================================
// Gateway Callbacks (query strings)
// ============================================================================

/// `approvalUrl` redirect: `?engagement_id=..&pg_token=..`
#[derive(Debug, Clone, Deserialize)]
pub struct ApproveCallbackQuery {
    pub engagement_id: Snowflake,
    pub pg_token: String,
}

/// `cancelUrl` / `failUrl` redirect: `?engagement_id=..`
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub engagement_id: Snowflake,
}
