//! In-memory implementation of every repository trait
//!
//! All tables live behind one lock, so the paired writes (`settle`,
//! `create_with_rating`, `delete_with_rating`) are atomic the same way the
//! PostgreSQL transactions are. Used by service tests and local runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use matching_core::entities::{
    CatalogOffer, Engagement, Estimate, Member, Payment, PaymentStatus, Review,
};
use matching_core::error::DomainError;
use matching_core::traits::{
    EngagementRepository, EstimateRepository, MemberRepository, OfferRepository,
    PaymentRepository, PaymentSettlement, RepoResult, ReviewRepository, SettlementWrite,
};
use matching_core::value_objects::{ExpertRating, Snowflake};

#[derive(Default)]
struct Tables {
    members: HashMap<Snowflake, Member>,
    offers: HashMap<Snowflake, CatalogOffer>,
    engagements: HashMap<Snowflake, Engagement>,
    estimates: HashMap<Snowflake, Estimate>,
    payments: HashMap<Snowflake, Payment>,
    reviews: HashMap<Snowflake, Review>,
    ratings: HashMap<Snowflake, ExpertRating>,
}

impl Tables {
    /// Version-checked write; mirrors `UPDATE ... WHERE version = $expected`
    fn update_engagement(&mut self, engagement: &Engagement) -> bool {
        match self.engagements.get_mut(&engagement.id) {
            Some(stored) if stored.version == engagement.version => {
                *stored = engagement.clone();
                stored.version += 1;
                true
            }
            _ => false,
        }
    }

    fn rating_mut(&mut self, expert_id: Snowflake) -> &mut ExpertRating {
        self.ratings
            .entry(expert_id)
            .or_insert_with(|| ExpertRating::empty(expert_id))
    }
}

/// Thread-safe in-memory store shared by all repository handles
#[derive(Default, Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a catalog offer
    pub async fn insert_offer(&self, offer: CatalogOffer) {
        self.tables.write().await.offers.insert(offer.id, offer);
    }

    pub async fn insert_member(&self, member: Member) {
        self.tables.write().await.members.insert(member.id, member);
    }

    /// All payments of an engagement, oldest first
    pub async fn payments(&self, engagement_id: Snowflake) -> Vec<Payment> {
        let tables = self.tables.read().await;
        let mut payments: Vec<Payment> = tables
            .payments
            .values()
            .filter(|p| p.engagement_id == engagement_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| (p.created_at, p.id));
        payments
    }

    /// Backdate a payment, for exercising the reconciliation grace period
    pub async fn set_payment_created_at(&self, id: Snowflake, created_at: DateTime<Utc>) {
        if let Some(payment) = self.tables.write().await.payments.get_mut(&id) {
            payment.created_at = created_at;
        }
    }
}

#[async_trait]
impl OfferRepository for InMemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<CatalogOffer>> {
        Ok(self.tables.read().await.offers.get(&id).cloned())
    }
}

#[async_trait]
impl MemberRepository for InMemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Member>> {
        Ok(self.tables.read().await.members.get(&id).cloned())
    }
}

#[async_trait]
impl EngagementRepository for InMemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Engagement>> {
        Ok(self.tables.read().await.engagements.get(&id).cloned())
    }

    async fn create(&self, engagement: &Engagement) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        let active_duplicate = tables.engagements.values().any(|e| {
            e.client_id == engagement.client_id
                && e.offer_id == engagement.offer_id
                && !e.status.is_terminal()
        });
        if active_duplicate || tables.engagements.contains_key(&engagement.id) {
            return Err(DomainError::DuplicateRequest);
        }
        tables.engagements.insert(engagement.id, engagement.clone());
        Ok(())
    }

    async fn update_status(&self, engagement: &Engagement) -> RepoResult<bool> {
        Ok(self.tables.write().await.update_engagement(engagement))
    }
}

#[async_trait]
impl EstimateRepository for InMemoryStore {
    async fn find_by_engagement(&self, engagement_id: Snowflake) -> RepoResult<Option<Estimate>> {
        Ok(self.tables.read().await.estimates.get(&engagement_id).cloned())
    }

    async fn create(&self, estimate: &Estimate) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        if tables.estimates.contains_key(&estimate.engagement_id) {
            return Err(DomainError::EstimateAlreadyExists);
        }
        tables.estimates.insert(estimate.engagement_id, estimate.clone());
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository for InMemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Payment>> {
        Ok(self.tables.read().await.payments.get(&id).cloned())
    }

    async fn find_latest_by_engagement(&self, engagement_id: Snowflake) -> RepoResult<Option<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .values()
            .filter(|p| p.engagement_id == engagement_id)
            .max_by_key(|p| (p.created_at, p.id))
            .cloned())
    }

    async fn find_paid_by_engagement(&self, engagement_id: Snowflake) -> RepoResult<Option<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .values()
            .filter(|p| p.engagement_id == engagement_id && p.is_paid())
            .max_by_key(|p| (p.created_at, p.id))
            .cloned())
    }

    async fn find_stale_unpaid(
        &self,
        created_before: DateTime<Utc>,
        limit: i64,
    ) -> RepoResult<Vec<Payment>> {
        let tables = self.tables.read().await;
        let mut stale: Vec<Payment> = tables
            .payments
            .values()
            .filter(|p| p.status == PaymentStatus::NotPaid && p.created_at < created_before)
            .cloned()
            .collect();
        stale.sort_by_key(|p| (p.created_at, p.id));
        stale.truncate(usize::try_from(limit.clamp(1, 1000)).unwrap_or(1000));
        Ok(stale)
    }

    async fn create(&self, payment: &Payment) -> RepoResult<()> {
        self.tables
            .write()
            .await
            .payments
            .insert(payment.id, payment.clone());
        Ok(())
    }

    async fn update_status_if(
        &self,
        id: Snowflake,
        expected: PaymentStatus,
        new: PaymentStatus,
    ) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.payments.get_mut(&id) {
            Some(payment) if payment.status == expected => {
                payment.status = new;
                payment.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn settle(&self, settlement: PaymentSettlement<'_>) -> RepoResult<SettlementWrite> {
        let mut tables = self.tables.write().await;

        let payment_ready = tables
            .payments
            .get(&settlement.payment_id)
            .is_some_and(|p| p.status == settlement.from);
        if !payment_ready {
            return Ok(SettlementWrite::PaymentMoved);
        }

        if let Some(engagement) = settlement.engagement {
            if !tables.update_engagement(engagement) {
                return Ok(SettlementWrite::EngagementMoved);
            }
        }

        if let Some(payment) = tables.payments.get_mut(&settlement.payment_id) {
            payment.status = settlement.to;
            payment.updated_at = Utc::now();
        }
        Ok(SettlementWrite::Applied)
    }
}

#[async_trait]
impl ReviewRepository for InMemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Review>> {
        Ok(self.tables.read().await.reviews.get(&id).cloned())
    }

    async fn find_by_engagement(&self, engagement_id: Snowflake) -> RepoResult<Option<Review>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .values()
            .find(|r| r.engagement_id == engagement_id)
            .cloned())
    }

    async fn expert_rating(&self, expert_id: Snowflake) -> RepoResult<ExpertRating> {
        let tables = self.tables.read().await;
        Ok(tables
            .ratings
            .get(&expert_id)
            .copied()
            .unwrap_or_else(|| ExpertRating::empty(expert_id)))
    }

    async fn create_with_rating(&self, review: &Review) -> RepoResult<ExpertRating> {
        let mut tables = self.tables.write().await;
        if tables
            .reviews
            .values()
            .any(|r| r.engagement_id == review.engagement_id)
        {
            return Err(DomainError::ReviewAlreadyExists);
        }
        tables.reviews.insert(review.id, review.clone());

        let rating = tables.rating_mut(review.expert_id);
        rating.add(review.score);
        Ok(*rating)
    }

    async fn delete_with_rating(&self, review: &Review) -> RepoResult<ExpertRating> {
        let mut tables = self.tables.write().await;
        if tables.reviews.remove(&review.id).is_none() {
            return Err(DomainError::ReviewNotFound(review.id));
        }

        let rating = tables.rating_mut(review.expert_id);
        rating.sub(review.score);
        Ok(*rating)
    }
}
