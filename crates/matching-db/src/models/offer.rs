//! Offer database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for offers table
#[derive(Debug, Clone, FromRow)]
pub struct OfferModel {
    pub id: i64,
    pub expert_id: i64,
    pub title: String,
    pub base_price: i64,
    pub updated_at: DateTime<Utc>,
}

/// Database model for offer_options table
#[derive(Debug, Clone, FromRow)]
pub struct OfferOptionModel {
    pub id: i64,
    pub offer_id: i64,
    pub name: String,
    pub additional_price: i64,
}
