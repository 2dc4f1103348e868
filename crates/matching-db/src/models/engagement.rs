//! Engagement database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for engagements table
#[derive(Debug, Clone, FromRow)]
pub struct EngagementModel {
    pub id: i64,
    pub client_id: i64,
    pub expert_id: i64,
    pub offer_id: i64,
    pub status: String,
    pub work_started_at: Option<DateTime<Utc>>,
    pub work_ended_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
