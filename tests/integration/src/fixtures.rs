//! Test fixtures and data generators
//!
//! Seeds members and offers straight into PostgreSQL (they are owned by
//! other services in production) and mirrors the API's JSON shapes.

use std::sync::OnceLock;

use anyhow::Result;
use matching_core::{Actor, Snowflake, SnowflakeGenerator};
use matching_db::PgPool;
use serde::Deserialize;

pub const BASE_PRICE: i64 = 120_000;
pub const REVISION_PRICE: i64 = 20_000;
pub const SOURCE_PRICE: i64 = 10_000;

/// Time-based ids, so reruns against the same database never collide
pub fn unique_id() -> Snowflake {
    static GENERATOR: OnceLock<SnowflakeGenerator> = OnceLock::new();
    GENERATOR.get_or_init(|| SnowflakeGenerator::new(1002)).generate()
}

/// One client, one expert and the expert's offer with two options
#[derive(Debug, Clone, Copy)]
pub struct Marketplace {
    pub client: Actor,
    pub expert: Actor,
    pub offer_id: Snowflake,
    pub revision_option: Snowflake,
    pub source_option: Snowflake,
}

impl Marketplace {
    pub async fn seed(pool: &PgPool) -> Result<Self> {
        let client = unique_id();
        let expert = unique_id();
        for (id, role) in [(client, "CLIENT"), (expert, "EXPERT")] {
            sqlx::query("INSERT INTO members (id, role, nickname) VALUES ($1, $2, $3)")
                .bind(id.into_inner())
                .bind(role)
                .bind(format!("member_{id}"))
                .execute(pool)
                .await?;
        }

        let offer_id = unique_id();
        sqlx::query("INSERT INTO offers (id, expert_id, title, base_price) VALUES ($1, $2, $3, $4)")
            .bind(offer_id.into_inner())
            .bind(expert.into_inner())
            .bind("Brand identity")
            .bind(BASE_PRICE)
            .execute(pool)
            .await?;

        let revision_option = unique_id();
        let source_option = unique_id();
        for (position, (id, name, price)) in [
            (revision_option, "Extra revision", REVISION_PRICE),
            (source_option, "Source files", SOURCE_PRICE),
        ]
        .into_iter()
        .enumerate()
        {
            sqlx::query(
                "INSERT INTO offer_options (id, offer_id, name, additional_price, position) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(id.into_inner())
            .bind(offer_id.into_inner())
            .bind(name)
            .bind(price)
            .bind(position as i32)
            .execute(pool)
            .await?;
        }

        Ok(Self {
            client: Actor::client(client),
            expert: Actor::expert(expert),
            offer_id,
            revision_option,
            source_option,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementBody {
    pub id: String,
    pub status: String,
    pub work_started_at: Option<String>,
    pub work_ended_at: Option<String>,
    pub cancel_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateBody {
    pub base_price: i64,
    pub total: i64,
    pub options: Vec<EstimateOptionBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateOptionBody {
    pub option_id: String,
    pub name: String,
    pub price: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareBody {
    pub payment_id: String,
    pub redirect_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBody {
    pub id: String,
    pub cost: i64,
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementBody {
    pub outcome: String,
    pub payment: PaymentBody,
    pub engagement_status: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingBody {
    pub rating: f64,
    pub review_count: i32,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}
