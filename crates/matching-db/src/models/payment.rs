//! Payment database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for payments table
#[derive(Debug, Clone, FromRow)]
pub struct PaymentModel {
    pub id: i64,
    pub engagement_id: i64,
    pub cost: i64,
    pub status: String,
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
