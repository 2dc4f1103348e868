//! Model -> entity mappers
//!
//! Status and money columns are validated on the way in, so a corrupt row
//! surfaces as an error instead of a silently wrong entity.

mod engagement;
mod estimate;
mod member;
mod offer;
mod payment;
mod review;

pub use estimate::estimate_from_rows;
pub use offer::offer_from_rows;
