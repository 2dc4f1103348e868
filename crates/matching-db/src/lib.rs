//! # matching-db
//!
//! Persistence for the matching engine.
//!
//! ## Overview
//!
//! - PostgreSQL implementations of the repository traits in `matching-core`,
//!   using one transaction for every paired write
//! - Row models with SQLx `FromRow` derives and model -> entity mappers
//! - The schema, applied idempotently at startup
//! - [`InMemoryStore`], a single-lock implementation of every repository used
//!   by unit tests and local runs without PostgreSQL
//!
//! ## Usage
//!
//! ```rust,ignore
//! use matching_db::{apply_schema, create_pool, DatabaseConfig, PgEngagementRepository};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::from_env()).await?;
//!     apply_schema(&pool).await?;
//!     let engagements = PgEngagementRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::InMemoryStore;
pub use pool::{apply_schema, create_pool, create_pool_from_env, DatabaseConfig, PgPool};
pub use repositories::{
    PgEngagementRepository, PgEstimateRepository, PgMemberRepository, PgOfferRepository,
    PgPaymentRepository, PgReviewRepository,
};
