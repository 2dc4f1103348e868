//! Estimate database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for estimates table
#[derive(Debug, Clone, FromRow)]
pub struct EstimateModel {
    pub id: i64,
    pub engagement_id: i64,
    pub item_name: String,
    pub base_price: i64,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

/// Database model for estimate_options table (frozen option copies)
#[derive(Debug, Clone, FromRow)]
pub struct EstimateOptionModel {
    pub estimate_id: i64,
    pub position: i32,
    pub option_id: i64,
    pub name: String,
    pub price: i64,
}
