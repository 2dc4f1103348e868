//! # matching-service
//!
//! Application layer: the use cases of the matching engine on top of the
//! repository and gateway ports.
//!
//! - [`services::EstimateService`]: frozen price snapshots
//! - [`services::MatchingService`]: the engagement lifecycle
//! - [`services::SettlementService`]: payment sessions and gateway outcomes
//! - [`services::ReviewService`]: reviews and expert ratings
//! - [`services::Reconciler`]: background sweep for payments stuck in `NOT_PAID`

pub mod dto;
pub mod services;

pub use services::{
    EstimateService, MatchingService, Reconciler, ReviewService, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult, ServiceSettings, SettlementOutcome,
    SettlementResult, SettlementService, SweepReport,
};
