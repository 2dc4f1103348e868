//! PostgreSQL implementation of ReviewRepository
//!
//! The review row and the expert's rating aggregate change in one
//! transaction; the aggregate row is locked with `FOR UPDATE` so concurrent
//! reviews of the same expert serialize on it.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use matching_core::entities::Review;
use matching_core::error::DomainError;
use matching_core::traits::{RepoResult, ReviewRepository};
use matching_core::value_objects::{ExpertRating, Snowflake};

use crate::models::{ExpertRatingModel, ReviewModel};

use super::error::{map_db_error, map_unique_violation};

/// PostgreSQL implementation of ReviewRepository
#[derive(Clone)]
pub struct PgReviewRepository {
    pool: PgPool,
}

impl PgReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Lock (creating if needed) the rating row of an expert
async fn lock_rating(conn: &mut PgConnection, expert_id: Snowflake) -> RepoResult<ExpertRating> {
    sqlx::query(
        r#"
        INSERT INTO expert_ratings (expert_id, rating_sum, review_count, updated_at)
        VALUES ($1, 0, 0, NOW())
        ON CONFLICT (expert_id) DO NOTHING
        "#,
    )
    .bind(expert_id.into_inner())
    .execute(&mut *conn)
    .await
    .map_err(map_db_error)?;

    let model = sqlx::query_as::<_, ExpertRatingModel>(
        r#"
        SELECT expert_id, rating_sum, review_count
        FROM expert_ratings
        WHERE expert_id = $1
        FOR UPDATE
        "#,
    )
    .bind(expert_id.into_inner())
    .fetch_one(&mut *conn)
    .await
    .map_err(map_db_error)?;

    Ok(ExpertRating::from(model))
}

async fn store_rating(conn: &mut PgConnection, rating: &ExpertRating) -> RepoResult<()> {
    sqlx::query(
        r#"
        UPDATE expert_ratings
        SET rating_sum = $2, review_count = $3, updated_at = NOW()
        WHERE expert_id = $1
        "#,
    )
    .bind(rating.expert_id.into_inner())
    .bind(rating.rating_sum())
    .bind(rating.review_count())
    .execute(&mut *conn)
    .await
    .map_err(map_db_error)?;

    Ok(())
}

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Review>> {
        let result = sqlx::query_as::<_, ReviewModel>(
            r#"
            SELECT id, engagement_id, expert_id, author_id, score, content, created_at
            FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Review::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_engagement(&self, engagement_id: Snowflake) -> RepoResult<Option<Review>> {
        let result = sqlx::query_as::<_, ReviewModel>(
            r#"
            SELECT id, engagement_id, expert_id, author_id, score, content, created_at
            FROM reviews
            WHERE engagement_id = $1
            "#,
        )
        .bind(engagement_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Review::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn expert_rating(&self, expert_id: Snowflake) -> RepoResult<ExpertRating> {
        let result = sqlx::query_as::<_, ExpertRatingModel>(
            r#"
            SELECT expert_id, rating_sum, review_count
            FROM expert_ratings
            WHERE expert_id = $1
            "#,
        )
        .bind(expert_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map_or_else(|| ExpertRating::empty(expert_id), ExpertRating::from))
    }

    #[instrument(skip(self, review), fields(review_id = %review.id, expert_id = %review.expert_id))]
    async fn create_with_rating(&self, review: &Review) -> RepoResult<ExpertRating> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            r#"
            INSERT INTO reviews (id, engagement_id, expert_id, author_id, score, content, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(review.id.into_inner())
        .bind(review.engagement_id.into_inner())
        .bind(review.expert_id.into_inner())
        .bind(review.author_id.into_inner())
        .bind(i16::from(review.score.value()))
        .bind(&review.content)
        .bind(review.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::ReviewAlreadyExists))?;

        let mut rating = lock_rating(&mut tx, review.expert_id).await?;
        rating.add(review.score);
        store_rating(&mut tx, &rating).await?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(rating)
    }

    #[instrument(skip(self, review), fields(review_id = %review.id, expert_id = %review.expert_id))]
    async fn delete_with_rating(&self, review: &Review) -> RepoResult<ExpertRating> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let deleted = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review.id.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await.map_err(map_db_error)?;
            return Err(DomainError::ReviewNotFound(review.id));
        }

        let mut rating = lock_rating(&mut tx, review.expert_id).await?;
        rating.sub(review.score);
        store_rating(&mut tx, &rating).await?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(rating)
    }
}
