//! Service context - dependency container for services
//!
//! Holds the repositories, the payment gateway, the id generator and the
//! tunable settings every service needs.

use std::sync::Arc;
use std::time::Duration;

use matching_common::AppConfig;
use matching_core::traits::{
    EngagementRepository, EstimateRepository, MemberRepository, OfferRepository, PaymentGateway,
    PaymentRepository, ReviewRepository,
};
use matching_core::{EstimatePolicy, Snowflake, SnowflakeGenerator};
use matching_db::{
    InMemoryStore, PgEngagementRepository, PgEstimateRepository, PgMemberRepository,
    PgOfferRepository, PgPaymentRepository, PgPool, PgReviewRepository,
};

use super::error::{ServiceError, ServiceResult};

/// Tunables taken from configuration
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub estimate_policy: EstimatePolicy,
    /// Public base URL of this API; gateway redirects land under it
    pub callback_base_url: String,
    /// Minimum age before a `NOT_PAID` payment is reconciled
    pub reconcile_grace: chrono::Duration,
    pub reconcile_batch_size: i64,
    pub reconcile_interval: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            estimate_policy: EstimatePolicy::default(),
            callback_base_url: "http://localhost:8080".to_string(),
            reconcile_grace: chrono::Duration::minutes(15),
            reconcile_batch_size: 100,
            reconcile_interval: Duration::from_secs(60),
        }
    }
}

impl ServiceSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            estimate_policy: EstimatePolicy {
                reject_unknown_options: config.estimate.reject_unknown_options,
            },
            callback_base_url: config.payment.callback_base_url.trim_end_matches('/').to_string(),
            reconcile_grace: chrono::Duration::seconds(config.settlement.reconcile_grace_secs),
            reconcile_batch_size: config.settlement.reconcile_batch_size,
            reconcile_interval: Duration::from_secs(config.settlement.reconcile_interval_secs.max(1)),
        }
    }
}

/// Service context containing all dependencies
#[derive(Clone)]
pub struct ServiceContext {
    // Present only when backed by PostgreSQL
    pool: Option<PgPool>,

    // Repositories
    member_repo: Arc<dyn MemberRepository>,
    offer_repo: Arc<dyn OfferRepository>,
    engagement_repo: Arc<dyn EngagementRepository>,
    estimate_repo: Arc<dyn EstimateRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
    review_repo: Arc<dyn ReviewRepository>,

    // External
    gateway: Arc<dyn PaymentGateway>,

    snowflake_generator: Arc<SnowflakeGenerator>,
    settings: ServiceSettings,
}

impl ServiceContext {
    // === Database Pool ===

    /// The PostgreSQL pool, if the context is backed by one
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    // === Repositories ===

    pub fn member_repo(&self) -> &dyn MemberRepository {
        self.member_repo.as_ref()
    }

    pub fn offer_repo(&self) -> &dyn OfferRepository {
        self.offer_repo.as_ref()
    }

    pub fn engagement_repo(&self) -> &dyn EngagementRepository {
        self.engagement_repo.as_ref()
    }

    pub fn estimate_repo(&self) -> &dyn EstimateRepository {
        self.estimate_repo.as_ref()
    }

    pub fn payment_repo(&self) -> &dyn PaymentRepository {
        self.payment_repo.as_ref()
    }

    pub fn review_repo(&self) -> &dyn ReviewRepository {
        self.review_repo.as_ref()
    }

    // === External ===

    /// The payment gateway client
    pub fn gateway(&self) -> &dyn PaymentGateway {
        self.gateway.as_ref()
    }

    // === Settings / ids ===

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Generate a new Snowflake ID
    pub fn generate_id(&self) -> Snowflake {
        self.snowflake_generator.generate()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("pool", &self.pool.as_ref().map(|_| "PgPool"))
            .field("repositories", &"...")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    pool: Option<PgPool>,
    member_repo: Option<Arc<dyn MemberRepository>>,
    offer_repo: Option<Arc<dyn OfferRepository>>,
    engagement_repo: Option<Arc<dyn EngagementRepository>>,
    estimate_repo: Option<Arc<dyn EstimateRepository>>,
    payment_repo: Option<Arc<dyn PaymentRepository>>,
    review_repo: Option<Arc<dyn ReviewRepository>>,
    gateway: Option<Arc<dyn PaymentGateway>>,
    snowflake_generator: Option<Arc<SnowflakeGenerator>>,
    settings: ServiceSettings,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the PostgreSQL repositories on `pool`
    pub fn postgres(mut self, pool: PgPool) -> Self {
        self.member_repo = Some(Arc::new(PgMemberRepository::new(pool.clone())));
        self.offer_repo = Some(Arc::new(PgOfferRepository::new(pool.clone())));
        self.engagement_repo = Some(Arc::new(PgEngagementRepository::new(pool.clone())));
        self.estimate_repo = Some(Arc::new(PgEstimateRepository::new(pool.clone())));
        self.payment_repo = Some(Arc::new(PgPaymentRepository::new(pool.clone())));
        self.review_repo = Some(Arc::new(PgReviewRepository::new(pool.clone())));
        self.pool = Some(pool);
        self
    }

    /// Use one in-memory store for every repository
    pub fn in_memory(mut self, store: InMemoryStore) -> Self {
        self.member_repo = Some(Arc::new(store.clone()));
        self.offer_repo = Some(Arc::new(store.clone()));
        self.engagement_repo = Some(Arc::new(store.clone()));
        self.estimate_repo = Some(Arc::new(store.clone()));
        self.payment_repo = Some(Arc::new(store.clone()));
        self.review_repo = Some(Arc::new(store));
        self.pool = None;
        self
    }

    pub fn member_repo(mut self, repo: Arc<dyn MemberRepository>) -> Self {
        self.member_repo = Some(repo);
        self
    }

    pub fn offer_repo(mut self, repo: Arc<dyn OfferRepository>) -> Self {
        self.offer_repo = Some(repo);
        self
    }

    pub fn engagement_repo(mut self, repo: Arc<dyn EngagementRepository>) -> Self {
        self.engagement_repo = Some(repo);
        self
    }

    pub fn estimate_repo(mut self, repo: Arc<dyn EstimateRepository>) -> Self {
        self.estimate_repo = Some(repo);
        self
    }

    pub fn payment_repo(mut self, repo: Arc<dyn PaymentRepository>) -> Self {
        self.payment_repo = Some(repo);
        self
    }

    pub fn review_repo(mut self, repo: Arc<dyn ReviewRepository>) -> Self {
        self.review_repo = Some(repo);
        self
    }

    pub fn gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn snowflake_generator(mut self, generator: Arc<SnowflakeGenerator>) -> Self {
        self.snowflake_generator = Some(generator);
        self
    }

    pub fn settings(mut self, settings: ServiceSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Internal` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        fn required<T>(value: Option<T>, name: &str) -> ServiceResult<T> {
            value.ok_or_else(|| ServiceError::internal(format!("{name} is required")))
        }

        Ok(ServiceContext {
            pool: self.pool,
            member_repo: required(self.member_repo, "member_repo")?,
            offer_repo: required(self.offer_repo, "offer_repo")?,
            engagement_repo: required(self.engagement_repo, "engagement_repo")?,
            estimate_repo: required(self.estimate_repo, "estimate_repo")?,
            payment_repo: required(self.payment_repo, "payment_repo")?,
            review_repo: required(self.review_repo, "review_repo")?,
            gateway: required(self.gateway, "gateway")?,
            snowflake_generator: self.snowflake_generator.unwrap_or_default(),
            settings: self.settings,
        })
    }
}
