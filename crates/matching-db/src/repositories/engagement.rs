//! PostgreSQL implementation of EngagementRepository

use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};
use tracing::instrument;

use matching_core::entities::Engagement;
use matching_core::error::DomainError;
use matching_core::traits::{EngagementRepository, RepoResult};
use matching_core::value_objects::Snowflake;

use crate::models::EngagementModel;

use super::error::{map_db_error, map_unique_violation};

/// PostgreSQL implementation of EngagementRepository
#[derive(Clone)]
pub struct PgEngagementRepository {
    pool: PgPool,
}

impl PgEngagementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Version-checked status write, shared with the settlement transaction.
///
/// `engagement.version` is the version the transition was computed from.
pub(super) async fn update_engagement_status<'e, E>(
    executor: E,
    engagement: &Engagement,
) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE engagements
        SET status = $3,
            work_started_at = $4,
            work_ended_at = $5,
            cancel_reason = $6,
            version = version + 1,
            updated_at = $7
        WHERE id = $1 AND version = $2
        "#,
    )
    .bind(engagement.id.into_inner())
    .bind(engagement.version)
    .bind(engagement.status.as_str())
    .bind(engagement.work_started_at)
    .bind(engagement.work_ended_at)
    .bind(&engagement.cancel_reason)
    .bind(engagement.updated_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl EngagementRepository for PgEngagementRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Engagement>> {
        let result = sqlx::query_as::<_, EngagementModel>(
            r#"
            SELECT id, client_id, expert_id, offer_id, status, work_started_at, work_ended_at,
                   cancel_reason, version, created_at, updated_at
            FROM engagements
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Engagement::try_from).transpose()
    }

    #[instrument(skip(self, engagement), fields(engagement_id = %engagement.id))]
    async fn create(&self, engagement: &Engagement) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO engagements (id, client_id, expert_id, offer_id, status, version,
                                     created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(engagement.id.into_inner())
        .bind(engagement.client_id.into_inner())
        .bind(engagement.expert_id.into_inner())
        .bind(engagement.offer_id.into_inner())
        .bind(engagement.status.as_str())
        .bind(engagement.version)
        .bind(engagement.created_at)
        .bind(engagement.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::DuplicateRequest))?;

        Ok(())
    }

    #[instrument(skip(self, engagement), fields(engagement_id = %engagement.id, status = %engagement.status))]
    async fn update_status(&self, engagement: &Engagement) -> RepoResult<bool> {
        update_engagement_status(&self.pool, engagement)
            .await
            .map_err(map_db_error)
    }
}
