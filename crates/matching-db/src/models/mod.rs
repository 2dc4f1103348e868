//! Database models - row types for SQLx `FromRow`

mod engagement;
mod estimate;
mod member;
mod offer;
mod payment;
mod review;

pub use engagement::EngagementModel;
pub use estimate::{EstimateModel, EstimateOptionModel};
pub use member::MemberModel;
pub use offer::{OfferModel, OfferOptionModel};
pub use payment::PaymentModel;
pub use review::{ExpertRatingModel, ReviewModel};
