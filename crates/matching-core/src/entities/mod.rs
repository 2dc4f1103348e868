//! Domain entities - core business objects

mod engagement;
mod estimate;
mod member;
mod offer;
mod payment;
mod review;

pub use engagement::{Engagement, EngagementStatus};
pub use estimate::{Estimate, EstimateOption, EstimatePolicy};
pub use member::{Member, MemberRole};
pub use offer::{CatalogOffer, OfferOption};
pub use payment::{Payment, PaymentStatus};
pub use review::Review;
