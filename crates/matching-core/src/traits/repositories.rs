//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation. Every write that pairs two rows is a single
//! method here, so an implementation can make it one atomic unit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{
    CatalogOffer, Engagement, Estimate, Member, Payment, PaymentStatus, Review,
};
use crate::error::DomainError;
use crate::value_objects::{ExpertRating, Snowflake};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Collaborator readers
// ============================================================================

#[async_trait]
pub trait OfferRepository: Send + Sync {
    /// Find an offer with its current options
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<CatalogOffer>>;
}

#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Find member by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Member>>;
}

// ============================================================================
// Engagement Repository
// ============================================================================

#[async_trait]
pub trait EngagementRepository: Send + Sync {
    /// Find engagement by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Engagement>>;

    /// Insert a new engagement.
    /// Fails with `DuplicateRequest` while another non-terminal engagement
    /// exists for the same (client, offer) pair.
    async fn create(&self, engagement: &Engagement) -> RepoResult<()>;

    /// Persist a transition computed by `Engagement::apply`.
    /// Succeeds only if the stored version still equals `engagement.version`;
    /// returns `false` when another writer got there first.
    async fn update_status(&self, engagement: &Engagement) -> RepoResult<bool>;
}

// ============================================================================
// Estimate Repository
// ============================================================================

#[async_trait]
pub trait EstimateRepository: Send + Sync {
    /// Find the estimate of an engagement
    async fn find_by_engagement(&self, engagement_id: Snowflake) -> RepoResult<Option<Estimate>>;

    /// Insert an estimate together with its option copies.
    /// Fails with `EstimateAlreadyExists` if the engagement already has one.
    async fn create(&self, estimate: &Estimate) -> RepoResult<()>;
}

// ============================================================================
// Payment Repository
// ============================================================================

/// A payment status change, optionally paired with an engagement transition
#[derive(Debug, Clone, Copy)]
pub struct PaymentSettlement<'a> {
    pub payment_id: Snowflake,
    pub from: PaymentStatus,
    pub to: PaymentStatus,
    /// Transition to persist in the same unit (version-checked)
    pub engagement: Option<&'a Engagement>,
}

/// Outcome of [`PaymentRepository::settle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementWrite {
    /// Both writes were committed
    Applied,
    /// The payment was no longer in `from`; nothing was written
    PaymentMoved,
    /// The engagement version changed; nothing was written
    EngagementMoved,
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Find payment by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Payment>>;

    /// The most recently created payment of an engagement
    async fn find_latest_by_engagement(&self, engagement_id: Snowflake) -> RepoResult<Option<Payment>>;

    /// The `PAID` payment of an engagement, whichever session it came from
    async fn find_paid_by_engagement(&self, engagement_id: Snowflake) -> RepoResult<Option<Payment>>;

    /// `NOT_PAID` payments created before `created_before`, oldest first
    async fn find_stale_unpaid(
        &self,
        created_before: DateTime<Utc>,
        limit: i64,
    ) -> RepoResult<Vec<Payment>>;

    /// Insert a new payment
    async fn create(&self, payment: &Payment) -> RepoResult<()>;

    /// Compare-and-set the payment status
    async fn update_status_if(
        &self,
        id: Snowflake,
        expected: PaymentStatus,
        new: PaymentStatus,
    ) -> RepoResult<bool>;

    /// Apply a payment status change and an engagement transition atomically
    async fn settle(&self, settlement: PaymentSettlement<'_>) -> RepoResult<SettlementWrite>;
}

// ============================================================================
// Review Repository
// ============================================================================

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Find review by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Review>>;

    /// Find the review of an engagement
    async fn find_by_engagement(&self, engagement_id: Snowflake) -> RepoResult<Option<Review>>;

    /// Current rating aggregate of an expert (empty if never reviewed)
    async fn expert_rating(&self, expert_id: Snowflake) -> RepoResult<ExpertRating>;

    /// Insert the review and add its score to the expert's rating atomically.
    /// Fails with `ReviewAlreadyExists` if the engagement already has a review.
    async fn create_with_rating(&self, review: &Review) -> RepoResult<ExpertRating>;

    /// Delete the review and subtract its score atomically
    async fn delete_with_rating(&self, review: &Review) -> RepoResult<ExpertRating>;
}
