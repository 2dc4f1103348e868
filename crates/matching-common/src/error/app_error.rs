//! Application error types
//!
//! Unified error handling shared by the service and transport layers.

use matching_core::{DomainError, GatewayError};
use serde::Serialize;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(String),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),

    // Domain errors (includes gateway failures)
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Self::Validation(_) => 400,

            // 401 Unauthorized
            Self::InvalidToken | Self::TokenExpired => 401,

            // 500 Internal Server Error
            Self::Database(_) | Self::Internal(_) | Self::Config(_) => 500,

            Self::Domain(e) => domain_status(e),
        }
    }

    /// Get error code for API responses
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code())
    }

    /// Check if the caller may retry (after re-reading payment state)
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_gateway())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// HTTP status for a domain error
#[must_use]
pub fn domain_status(e: &DomainError) -> u16 {
    match e {
        DomainError::Gateway(GatewayError::Timeout) => 504,
        DomainError::Gateway(_) => 502,
        e if e.is_not_found() => 404,
        e if e.is_authorization() => 403,
        e if e.is_validation() => 400,
        e if e.is_conflict() || e.is_invalid_transition() => 409,
        _ => 500,
    }
}

/// Error response structure for API responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.to_string(),
            details: None,
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        Self::from(&err)
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use matching_core::{EngagementStatus, Snowflake};

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::InvalidToken.status_code(), 401);
        assert_eq!(AppError::TokenExpired.status_code(), 401);
        assert_eq!(AppError::Validation("test".to_string()).status_code(), 400);
        assert_eq!(AppError::Database("test".to_string()).status_code(), 500);
    }

    #[test]
    fn test_domain_status_codes() {
        let not_found = AppError::from(DomainError::EngagementNotFound(Snowflake::new(1)));
        assert_eq!(not_found.status_code(), 404);

        let invalid = AppError::from(DomainError::InvalidStateTransition {
            from: EngagementStatus::InProgress,
            action: "confirm",
        });
        assert_eq!(invalid.status_code(), 409);
        assert_eq!(invalid.error_code(), "INVALID_STATE_TRANSITION");

        let timeout = AppError::from(DomainError::Gateway(GatewayError::Timeout));
        assert_eq!(timeout.status_code(), 504);
        assert!(timeout.is_retryable());

        let bad_gateway = AppError::from(DomainError::Gateway(GatewayError::Unavailable(503)));
        assert_eq!(bad_gateway.status_code(), 502);

        assert!(!AppError::from(DomainError::DuplicateRequest).is_retryable());
    }

    #[test]
    fn test_client_and_server_errors() {
        assert!(AppError::TokenExpired.is_client_error());
        assert!(!AppError::Database("test".to_string()).is_client_error());
        assert!(AppError::Config("test".to_string()).is_server_error());
    }

    #[test]
    fn test_error_response() {
        let err = AppError::Validation("optionIds must not repeat".to_string());
        let response = ErrorResponse::from(&err);

        assert_eq!(response.code, "VALIDATION_ERROR");
        assert_eq!(response.message, "Validation error: optionIds must not repeat");
        assert!(response.details.is_none());

        let response = ErrorResponse::from(AppError::from(DomainError::DuplicateRequest));
        assert_eq!(response.code, DomainError::DuplicateRequest.code());
    }
}
