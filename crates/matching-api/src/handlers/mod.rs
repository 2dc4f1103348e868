//! Route handlers
//!
//! All HTTP request handlers organized by domain.

pub mod engagements;
pub mod estimates;
pub mod health;
pub mod payments;
pub mod reviews;
