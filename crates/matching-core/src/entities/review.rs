//! Review entity - a client's score for a confirmed engagement

use chrono::{DateTime, Utc};

use crate::value_objects::{Score, Snowflake};

/// Review entity. At most one per engagement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: Snowflake,
    pub engagement_id: Snowflake,
    pub expert_id: Snowflake,
    pub author_id: Snowflake,
    pub score: Score,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
