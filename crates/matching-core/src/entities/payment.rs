//! Payment entity - one attempt to settle an engagement's estimate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::{Money, Snowflake};

/// Settlement status of a payment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    NotPaid,
    Paid,
    Failed,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotPaid => "NOT_PAID",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_PAID" => Ok(Self::NotPaid),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            "REFUNDED" => Ok(Self::Refunded),
            other => Err(DomainError::InternalError(format!(
                "unknown payment status: {other}"
            ))),
        }
    }
}

/// Payment entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub id: Snowflake,
    pub engagement_id: Snowflake,
    pub cost: Money,
    pub status: PaymentStatus,
    /// Gateway session / transaction reference
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// A payment session that was just opened at the gateway
    pub fn new(
        id: Snowflake,
        engagement_id: Snowflake,
        cost: Money,
        transaction_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            engagement_id,
            cost,
            status: PaymentStatus::NotPaid,
            transaction_id: transaction_id.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Key sent with every gateway call for this payment, so a retried
    /// call is deduplicated by the gateway instead of settling twice
    pub fn idempotency_key(&self, operation: &str) -> String {
        format!("{}:{operation}", self.id)
    }

    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}
