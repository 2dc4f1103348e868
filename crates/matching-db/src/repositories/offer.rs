//! PostgreSQL implementation of OfferRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use matching_core::entities::CatalogOffer;
use matching_core::traits::{OfferRepository, RepoResult};
use matching_core::value_objects::Snowflake;

use crate::mappers::offer_from_rows;
use crate::models::{OfferModel, OfferOptionModel};

use super::error::map_db_error;

/// PostgreSQL implementation of OfferRepository
#[derive(Clone)]
pub struct PgOfferRepository {
    pool: PgPool,
}

impl PgOfferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the current options of an offer, in catalog order
    async fn load_options(&self, offer_id: i64) -> RepoResult<Vec<OfferOptionModel>> {
        sqlx::query_as::<_, OfferOptionModel>(
            r#"
            SELECT id, offer_id, name, additional_price
            FROM offer_options
            WHERE offer_id = $1
            ORDER BY position, id
            "#,
        )
        .bind(offer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)
    }
}

#[async_trait]
impl OfferRepository for PgOfferRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<CatalogOffer>> {
        let result = sqlx::query_as::<_, OfferModel>(
            r#"
            SELECT id, expert_id, title, base_price, updated_at
            FROM offers
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        match result {
            Some(model) => {
                let options = self.load_options(model.id).await?;
                Ok(Some(offer_from_rows(model, options)?))
            }
            None => Ok(None),
        }
    }
}
