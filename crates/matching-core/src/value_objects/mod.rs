//! Value objects - immutable types that represent domain concepts

mod actor;
mod money;
mod rating;
mod snowflake;

pub use actor::{Actor, ActorRole};
pub use money::Money;
pub use rating::{ExpertRating, Score};
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};
