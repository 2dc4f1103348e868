//! Integration test utilities for the matching engine
//!
//! Spawns the HTTP API in-process on top of PostgreSQL and a recording
//! payment gateway, and drives it over real HTTP.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
