//! Inputs that drive an engagement through its lifecycle.
//!
//! User actions and gateway outcomes are both expressed as events, so every
//! status change goes through the same guard in [`crate::Engagement::apply`].

use serde::{Deserialize, Serialize};

/// The expert's answer to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "ACCEPTED")]
    Accept,
    #[serde(rename = "REJECTED")]
    Reject,
}

/// State machine input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngagementEvent {
    Decide { decision: Decision },
    StartWork,
    CompleteWork,
    Confirm,
    Cancel { reason: String },
    /// The gateway confirmed payment of the engagement's estimate
    PaymentConfirmed,
}

impl EngagementEvent {
    pub fn decide(decision: Decision) -> Self {
        Self::Decide { decision }
    }

    pub fn cancel(reason: impl Into<String>) -> Self {
        Self::Cancel {
            reason: reason.into(),
        }
    }

    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Decide { .. } => "DECIDE",
            Self::StartWork => "START_WORK",
            Self::CompleteWork => "COMPLETE_WORK",
            Self::Confirm => "CONFIRM",
            Self::Cancel { .. } => "CANCEL",
            Self::PaymentConfirmed => "PAYMENT_CONFIRMED",
        }
    }

    /// Human readable verb, used in error messages
    pub fn action(&self) -> &'static str {
        match self {
            Self::Decide {
                decision: Decision::Accept,
            } => "accept",
            Self::Decide {
                decision: Decision::Reject,
            } => "reject",
            Self::StartWork => "start work on",
            Self::CompleteWork => "complete work on",
            Self::Confirm => "confirm",
            Self::Cancel { .. } => "cancel",
            Self::PaymentConfirmed => "confirm payment for",
        }
    }
}
