//! PostgreSQL implementation of EstimateRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use matching_core::entities::Estimate;
use matching_core::error::DomainError;
use matching_core::traits::{EstimateRepository, RepoResult};
use matching_core::value_objects::Snowflake;

use crate::mappers::estimate_from_rows;
use crate::models::{EstimateModel, EstimateOptionModel};

use super::error::{map_db_error, map_unique_violation};

/// PostgreSQL implementation of EstimateRepository
#[derive(Clone)]
pub struct PgEstimateRepository {
    pool: PgPool,
}

impl PgEstimateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EstimateRepository for PgEstimateRepository {
    #[instrument(skip(self))]
    async fn find_by_engagement(&self, engagement_id: Snowflake) -> RepoResult<Option<Estimate>> {
        let result = sqlx::query_as::<_, EstimateModel>(
            r#"
            SELECT id, engagement_id, item_name, base_price, total, created_at
            FROM estimates
            WHERE engagement_id = $1
            "#,
        )
        .bind(engagement_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        let Some(model) = result else {
            return Ok(None);
        };

        let options = sqlx::query_as::<_, EstimateOptionModel>(
            r#"
            SELECT estimate_id, position, option_id, name, price
            FROM estimate_options
            WHERE estimate_id = $1
            ORDER BY position
            "#,
        )
        .bind(model.id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(Some(estimate_from_rows(model, options)?))
    }

    #[instrument(skip(self, estimate), fields(engagement_id = %estimate.engagement_id))]
    async fn create(&self, estimate: &Estimate) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            r#"
            INSERT INTO estimates (id, engagement_id, item_name, base_price, total, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(estimate.id.into_inner())
        .bind(estimate.engagement_id.into_inner())
        .bind(&estimate.item_name)
        .bind(estimate.base_price.amount())
        .bind(estimate.total.amount())
        .bind(estimate.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::EstimateAlreadyExists))?;

        for (position, option) in estimate.options.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO estimate_options (estimate_id, position, option_id, name, price)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(estimate.id.into_inner())
            .bind(position as i32)
            .bind(option.option_id.into_inner())
            .bind(&option.name)
            .bind(option.price.amount())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgEstimateRepository>();
    }
}
