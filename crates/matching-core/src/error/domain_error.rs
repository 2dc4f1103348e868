//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::entities::{EngagementStatus, PaymentStatus};
use crate::error::GatewayError;
use crate::value_objects::{ActorRole, Snowflake};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Engagement not found: {0}")]
    EngagementNotFound(Snowflake),

    #[error("Offer not found: {0}")]
    OfferNotFound(Snowflake),

    #[error("Estimate not found for engagement {0}")]
    EstimateNotFound(Snowflake),

    #[error("Payment not found for engagement {0}")]
    PaymentNotFound(Snowflake),

    #[error("Review not found: {0}")]
    ReviewNotFound(Snowflake),

    #[error("Member not found: {0}")]
    MemberNotFound(Snowflake),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unknown option ids: {0:?}")]
    UnknownOptions(Vec<Snowflake>),

    #[error("Option selected more than once: {0}")]
    DuplicateOption(Snowflake),

    #[error("Score must be between 0 and 5 (got {0})")]
    InvalidScore(i32),

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("{role} is not allowed to {action}")]
    PermissionDenied {
        role: ActorRole,
        action: &'static str,
    },

    #[error("Not a party to this engagement")]
    NotEngagementParty,

    #[error("Not the author of this review")]
    NotReviewAuthor,

    // =========================================================================
    // State Transition Errors
    // =========================================================================
    #[error("Cannot {action} an engagement in {from} state")]
    InvalidStateTransition {
        from: EngagementStatus,
        action: &'static str,
    },

    #[error("Cannot {action} a payment in {status} state")]
    InvalidPaymentState {
        status: PaymentStatus,
        action: &'static str,
    },

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("An active request for this offer already exists")]
    DuplicateRequest,

    #[error("Engagement already has an estimate")]
    EstimateAlreadyExists,

    #[error("Engagement already has a review")]
    ReviewAlreadyExists,

    #[error("Engagement is already paid")]
    AlreadyPaid,

    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    // =========================================================================
    // External / Infrastructure Errors (wrapped)
    // =========================================================================
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::EngagementNotFound(_) => "UNKNOWN_ENGAGEMENT",
            Self::OfferNotFound(_) => "UNKNOWN_OFFER",
            Self::EstimateNotFound(_) => "UNKNOWN_ESTIMATE",
            Self::PaymentNotFound(_) => "UNKNOWN_PAYMENT",
            Self::ReviewNotFound(_) => "UNKNOWN_REVIEW",
            Self::MemberNotFound(_) => "UNKNOWN_MEMBER",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::UnknownOptions(_) => "UNKNOWN_OPTIONS",
            Self::DuplicateOption(_) => "DUPLICATE_OPTION",
            Self::InvalidScore(_) => "INVALID_SCORE",

            // Authorization
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::NotEngagementParty => "NOT_ENGAGEMENT_PARTY",
            Self::NotReviewAuthor => "NOT_REVIEW_AUTHOR",

            // State
            Self::InvalidStateTransition { .. } | Self::InvalidPaymentState { .. } => {
                "INVALID_STATE_TRANSITION"
            }

            // Conflict
            Self::DuplicateRequest => "DUPLICATE_REQUEST",
            Self::EstimateAlreadyExists => "ESTIMATE_EXISTS",
            Self::ReviewAlreadyExists => "REVIEW_EXISTS",
            Self::AlreadyPaid => "ALREADY_PAID",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",

            // External / Infrastructure
            Self::Gateway(e) => e.code(),
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::EngagementNotFound(_)
                | Self::OfferNotFound(_)
                | Self::EstimateNotFound(_)
                | Self::PaymentNotFound(_)
                | Self::ReviewNotFound(_)
                | Self::MemberNotFound(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::UnknownOptions(_)
                | Self::DuplicateOption(_)
                | Self::InvalidScore(_)
        )
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. } | Self::NotEngagementParty | Self::NotReviewAuthor
        )
    }

    /// Check if a state guard rejected the operation
    pub fn is_invalid_transition(&self) -> bool {
        matches!(
            self,
            Self::InvalidStateTransition { .. } | Self::InvalidPaymentState { .. }
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateRequest
                | Self::EstimateAlreadyExists
                | Self::ReviewAlreadyExists
                | Self::AlreadyPaid
                | Self::ConcurrentModification(_)
        )
    }

    /// Check if the payment gateway failed (the only retryable class)
    pub fn is_gateway(&self) -> bool {
        matches!(self, Self::Gateway(_))
    }
}
