//! # matching-core
//!
//! Domain layer of the matching engine: engagements and their lifecycle,
//! estimate snapshots, payments, expert ratings, and the ports (repository
//! and payment gateway traits) the outer layers implement.
//! This crate has no infrastructure dependencies.

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    CatalogOffer, Engagement, EngagementStatus, Estimate, EstimateOption, EstimatePolicy, Member,
    MemberRole, OfferOption, Payment, PaymentStatus, Review,
};
pub use error::{DomainError, GatewayError};
pub use events::{Decision, EngagementEvent};
pub use traits::{
    ApproveRequest, CancelRequest, EngagementRepository, EstimateRepository, GatewayPaymentState,
    GatewayResult, MemberRepository, OfferRepository, PaymentGateway, PaymentRepository,
    PaymentSettlement, ReadyRequest, ReadySession, RepoResult, ReviewRepository, SettlementWrite,
};
pub use value_objects::{
    Actor, ActorRole, ExpertRating, Money, Score, Snowflake, SnowflakeGenerator,
    SnowflakeParseError,
};
