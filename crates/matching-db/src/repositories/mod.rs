//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in matching-core.
//! Writes that pair two rows run in one transaction.

mod engagement;
mod error;
mod estimate;
mod member;
mod offer;
mod payment;
mod review;

pub use engagement::PgEngagementRepository;
pub use estimate::PgEstimateRepository;
pub use member::PgMemberRepository;
pub use offer::PgOfferRepository;
pub use payment::PgPaymentRepository;
pub use review::PgReviewRepository;
