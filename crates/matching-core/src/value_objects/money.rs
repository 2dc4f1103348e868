//! Money - non-negative amount in minor currency units

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// A non-negative monetary amount in the smallest currency unit.
///
/// The gateway settles in a currency without a fractional unit, so the
/// minor unit is also the major one and no rounding ever happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Create an amount, rejecting negative values
    pub fn new(amount: i64) -> Result<Self, DomainError> {
        if amount < 0 {
            return Err(DomainError::ValidationError(format!(
                "amount must not be negative (got {amount})"
            )));
        }
        Ok(Self(amount))
    }

    #[inline]
    pub const fn amount(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Add two amounts, failing on overflow
    pub fn checked_add(self, other: Money) -> Result<Money, DomainError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::ValidationError("amount overflow".to_string()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Money::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        assert!(Money::new(-1).is_err());
        assert_eq!(Money::new(0).unwrap(), Money::ZERO);
    }

    #[test]
    fn test_checked_add() {
        let a = Money::new(120_000).unwrap();
        let b = Money::new(30_000).unwrap();
        assert_eq!(a.checked_add(b).unwrap().amount(), 150_000);
        assert!(Money::new(i64::MAX).unwrap().checked_add(a).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        assert_eq!(serde_json::from_str::<Money>("500").unwrap().amount(), 500);
        assert!(serde_json::from_str::<Money>("-500").is_err());
    }
}
