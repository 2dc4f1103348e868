//! Review score and the expert's aggregated rating

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// A single review score, a whole number of stars from 0 to 5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    pub const MAX: u8 = 5;

    pub fn new(value: i32) -> Result<Self, DomainError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Score)
            .ok_or(DomainError::InvalidScore(value))
    }

    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = i32::deserialize(deserializer)?;
        Score::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Running aggregate of an expert's active review scores.
///
/// Stored as an exact integer sum and a count; the mean is derived on read,
/// so repeated add/remove cycles never accumulate rounding drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertRating {
    pub expert_id: Snowflake,
    rating_sum: i64,
    review_count: i32,
}

impl ExpertRating {
    /// An expert with no reviews yet
    pub const fn empty(expert_id: Snowflake) -> Self {
        Self {
            expert_id,
            rating_sum: 0,
            review_count: 0,
        }
    }

    /// Rebuild from persisted columns. Inconsistent rows (negative values)
    /// are clamped to the empty aggregate.
    pub fn from_parts(expert_id: Snowflake, rating_sum: i64, review_count: i32) -> Self {
        if rating_sum < 0 || review_count <= 0 {
            return Self::empty(expert_id);
        }
        Self {
            expert_id,
            rating_sum,
            review_count,
        }
    }

    /// Mean score, 0.0 when there are no reviews
    pub fn rating(&self) -> f64 {
        if self.review_count == 0 {
            0.0
        } else {
            self.rating_sum as f64 / f64::from(self.review_count)
        }
    }

    pub fn review_count(&self) -> i32 {
        self.review_count
    }

    pub fn rating_sum(&self) -> i64 {
        self.rating_sum
    }

    /// Account for a newly created review
    pub fn add(&mut self, score: Score) {
        if self.review_count == 0 {
            self.rating_sum = i64::from(score.value());
        } else {
            self.rating_sum += i64::from(score.value());
        }
        self.review_count += 1;
    }

    /// Account for a removed review. Removing the last review (or one from
    /// an already empty aggregate) resets to the empty state.
    pub fn sub(&mut self, score: Score) {
        if self.review_count <= 1 {
            self.rating_sum = 0;
            self.review_count = 0;
        } else {
            self.rating_sum = (self.rating_sum - i64::from(score.value())).max(0);
            self.review_count -= 1;
        }
    }
}
