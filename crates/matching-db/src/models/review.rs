//! Review and rating database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for reviews table
#[derive(Debug, Clone, FromRow)]
pub struct ReviewModel {
    pub id: i64,
    pub engagement_id: i64,
    pub expert_id: i64,
    pub author_id: i64,
    pub score: i16,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Database model for expert_ratings table
#[derive(Debug, Clone, FromRow)]
pub struct ExpertRatingModel {
    pub expert_id: i64,
    pub rating_sum: i64,
    pub review_count: i32,
}
