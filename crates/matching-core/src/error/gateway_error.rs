//! Failures talking to the external payment gateway

use thiserror::Error;

/// Errors from the payment gateway port.
///
/// None of these mean the business operation was refused for a business
/// reason on our side: the caller must re-read the payment before retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("payment gateway timed out")]
    Timeout,

    #[error("payment gateway unavailable (HTTP {0})")]
    Unavailable(u16),

    #[error("payment gateway rejected the request (HTTP {status}, {code}): {message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },

    #[error("payment gateway transport error: {0}")]
    Transport(String),

    #[error("invalid payment gateway response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout => "GATEWAY_TIMEOUT",
            Self::Unavailable(_) => "GATEWAY_UNAVAILABLE",
            Self::Rejected { .. } => "GATEWAY_REJECTED",
            Self::Transport(_) => "GATEWAY_TRANSPORT",
            Self::InvalidResponse(_) => "GATEWAY_INVALID_RESPONSE",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = GatewayError::Rejected {
            status: 400,
            code: "INVALID_TOKEN".to_string(),
            message: "approval token expired".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "payment gateway rejected the request (HTTP 400, INVALID_TOKEN): approval token expired"
        );
        assert_eq!(GatewayError::Unavailable(503).code(), "GATEWAY_UNAVAILABLE");
        assert!(GatewayError::Timeout.is_timeout());
    }
}
