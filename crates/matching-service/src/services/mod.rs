//! Business logic services
//!
//! Each service borrows the [`ServiceContext`] and orchestrates domain
//! operations against the repository and gateway ports.

pub mod context;
pub mod error;
pub mod estimate;
pub mod matching;
pub mod reconciler;
pub mod review;
pub mod settlement;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{ServiceContext, ServiceContextBuilder, ServiceSettings};
pub use error::{ServiceError, ServiceResult};
pub use estimate::EstimateService;
pub use matching::MatchingService;
pub use reconciler::{Reconciler, SweepReport};
pub use review::ReviewService;
pub use settlement::{SettlementOutcome, SettlementResult, SettlementService};
