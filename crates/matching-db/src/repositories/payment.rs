//! PostgreSQL implementation of PaymentRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use matching_core::entities::{Payment, PaymentStatus};
use matching_core::traits::{PaymentRepository, PaymentSettlement, RepoResult, SettlementWrite};
use matching_core::value_objects::Snowflake;

use crate::models::PaymentModel;

use super::engagement::update_engagement_status;
use super::error::map_db_error;

/// PostgreSQL implementation of PaymentRepository
#[derive(Clone)]
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_payments(models: Vec<PaymentModel>) -> RepoResult<Vec<Payment>> {
    models.into_iter().map(Payment::try_from).collect()
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Payment>> {
        let result = sqlx::query_as::<_, PaymentModel>(
            r#"
            SELECT id, engagement_id, cost, status, transaction_id, created_at, updated_at
            FROM payments
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Payment::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_latest_by_engagement(&self, engagement_id: Snowflake) -> RepoResult<Option<Payment>> {
        let result = sqlx::query_as::<_, PaymentModel>(
            r#"
            SELECT id, engagement_id, cost, status, transaction_id, created_at, updated_at
            FROM payments
            WHERE engagement_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(engagement_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Payment::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_paid_by_engagement(&self, engagement_id: Snowflake) -> RepoResult<Option<Payment>> {
        let result = sqlx::query_as::<_, PaymentModel>(
            r#"
            SELECT id, engagement_id, cost, status, transaction_id, created_at, updated_at
            FROM payments
            WHERE engagement_id = $1 AND status = 'PAID'
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(engagement_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Payment::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_stale_unpaid(
        &self,
        created_before: DateTime<Utc>,
        limit: i64,
    ) -> RepoResult<Vec<Payment>> {
        let limit = limit.clamp(1, 1000);

        let results = sqlx::query_as::<_, PaymentModel>(
            r#"
            SELECT id, engagement_id, cost, status, transaction_id, created_at, updated_at
            FROM payments
            WHERE status = 'NOT_PAID' AND created_at < $1
            ORDER BY created_at
            LIMIT $2
            "#,
        )
        .bind(created_before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        to_payments(results)
    }

    #[instrument(skip(self, payment), fields(payment_id = %payment.id))]
    async fn create(&self, payment: &Payment) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, engagement_id, cost, status, transaction_id,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(payment.id.into_inner())
        .bind(payment.engagement_id.into_inner())
        .bind(payment.cost.amount())
        .bind(payment.status.as_str())
        .bind(&payment.transaction_id)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_status_if(
        &self,
        id: Snowflake,
        expected: PaymentStatus,
        new: PaymentStatus,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id.into_inner())
        .bind(expected.as_str())
        .bind(new.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, settlement), fields(payment_id = %settlement.payment_id, to = %settlement.to))]
    async fn settle(&self, settlement: PaymentSettlement<'_>) -> RepoResult<SettlementWrite> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let moved = sqlx::query(
            r#"
            UPDATE payments
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(settlement.payment_id.into_inner())
        .bind(settlement.from.as_str())
        .bind(settlement.to.as_str())
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if moved.rows_affected() == 0 {
            tx.rollback().await.map_err(map_db_error)?;
            debug!("Payment left {} before settlement", settlement.from);
            return Ok(SettlementWrite::PaymentMoved);
        }

        if let Some(engagement) = settlement.engagement {
            let applied = update_engagement_status(&mut *tx, engagement)
                .await
                .map_err(map_db_error)?;
            if !applied {
                tx.rollback().await.map_err(map_db_error)?;
                debug!(engagement_id = %engagement.id, "Engagement version moved during settlement");
                return Ok(SettlementWrite::EngagementMoved);
            }
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(SettlementWrite::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgPaymentRepository>();
    }
}
