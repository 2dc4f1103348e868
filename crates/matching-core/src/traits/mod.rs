//! Ports implemented by the infrastructure crates

mod gateway;
mod repositories;

pub use gateway::{
    ApproveRequest, CancelRequest, GatewayPaymentState, GatewayResult, PaymentGateway,
    ReadyRequest, ReadySession,
};
pub use repositories::{
    EngagementRepository, EstimateRepository, MemberRepository, OfferRepository,
    PaymentRepository, PaymentSettlement, RepoResult, ReviewRepository, SettlementWrite,
};
