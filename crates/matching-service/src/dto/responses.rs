//! Response DTOs for API endpoints
//!
//! All response DTOs implement `Serialize` for JSON output (camelCase).
//! Snowflake IDs are serialized as strings for JavaScript compatibility.

use chrono::{DateTime, Utc};
use serde::Serialize;

// ============================================================================
// Engagement Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementResponse {
    pub id: String,
    pub client_id: String,
    pub expert_id: String,
    pub offer_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Estimate Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    pub id: String,
    pub engagement_id: String,
    pub item_name: String,
    pub base_price: i64,
    pub total: i64,
    pub options: Vec<EstimateOptionResponse>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateOptionResponse {
    pub option_id: String,
    pub name: String,
    pub price: i64,
}

// ============================================================================
// Payment Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: String,
    pub engagement_id: String,
    pub cost: i64,
    pub status: String,
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where to send the payer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparePaymentResponse {
    pub payment_id: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponse {
    /// `SETTLED` or `ALREADY_SETTLED`
    pub outcome: String,
    pub payment: PaymentResponse,
    pub engagement_status: String,
}

// ============================================================================
// Review Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: String,
    pub engagement_id: String,
    pub expert_id: String,
    pub author_id: String,
    pub score: u8,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertRatingResponse {
    pub expert_id: String,
    pub rating: f64,
    pub review_count: i32,
}

// ============================================================================
// Health Responses
// ============================================================================

/// Basic health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Readiness check response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    /// `healthy`, `unhealthy`, or `in-memory` when no database is configured
    pub database: String,
}

impl ReadinessResponse {
    pub fn ready(database: Option<bool>) -> Self {
        let (ready, database) = match database {
            Some(true) => (true, "healthy"),
            Some(false) => (false, "unhealthy"),
            None => (true, "in-memory"),
        };
        Self {
            status: if ready { "ready" } else { "not_ready" }.to_string(),
            timestamp: Utc::now(),
            checks: HealthChecks {
                database: database.to_string(),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_response_is_camel_case() {
        let response = PreparePaymentResponse {
            payment_id: "1".to_string(),
            redirect_url: "https://pg.test/T1".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["paymentId"], "1");
        assert_eq!(json["redirectUrl"], "https://pg.test/T1");
    }

    #[test]
    fn test_readiness() {
        assert!(ReadinessResponse::ready(Some(true)).is_ready());
        assert!(!ReadinessResponse::ready(Some(false)).is_ready());
        let in_memory = ReadinessResponse::ready(None);
        assert!(in_memory.is_ready());
        assert_eq!(in_memory.checks.database, "in-memory");
    }

    #[test]
    fn test_health_response() {
        assert_eq!(HealthResponse::healthy().status, "healthy");
    }
}
