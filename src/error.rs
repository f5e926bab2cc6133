//! Error types for the easypay library

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for easypay operations
pub type Result<T> = std::result::Result<T, EasypayError>;

/// Main error type for easypay operations
#[derive(Error, Debug)]
pub enum EasypayError {
    /// Local validation failure; never reaches the network
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Connection, TLS or timeout failure
    #[error("Transport error: {message}")]
    Transport { message: String, timed_out: bool },

    /// Processor answered with data that does not parse or lacks the redirect URL
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// Processor explicitly refused to create a payment URL
    #[error("Processor rejected payment: {message}")]
    ProcessorRejected { message: String },

    /// Order processor collaborator failure
    #[error("Order processing error: {message}")]
    Order { message: String },

    /// Credential provider failure
    #[error("Credentials error: {message}")]
    Credentials { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EasypayError {
    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            timed_out: false,
        }
    }

    /// Create a transport error caused by a timeout
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            timed_out: true,
        }
    }

    /// Create a malformed response error
    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a processor rejected error
    pub fn processor_rejected(message: impl Into<String>) -> Self {
        Self::ProcessorRejected {
            message: message.into(),
        }
    }

    /// Create an order processing error
    pub fn order(message: impl Into<String>) -> Self {
        Self::Order {
            message: message.into(),
        }
    }

    /// Create a credentials error
    pub fn credentials(message: impl Into<String>) -> Self {
        Self::Credentials {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Classify this error as the failure kind reported to callers.
    ///
    /// Local failures (validation, credentials, configuration) are reported
    /// as [`FailureKind::ProcessorRejected`]: the payment could not be
    /// initiated and retrying the same input will not help.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } | Self::Io(_) => FailureKind::TransportError,
            Self::MalformedResponse { .. } | Self::Json(_) => FailureKind::MalformedResponse,
            Self::InvalidRequest { .. }
            | Self::ProcessorRejected { .. }
            | Self::Order { .. }
            | Self::Credentials { .. }
            | Self::Config { .. } => FailureKind::ProcessorRejected,
        }
    }

    /// Detail text without the category prefix of `Display`
    pub fn detail(&self) -> String {
        match self {
            Self::InvalidRequest { message }
            | Self::Transport { message, .. }
            | Self::MalformedResponse { message }
            | Self::ProcessorRejected { message }
            | Self::Order { message }
            | Self::Credentials { message }
            | Self::Config { message } => message.clone(),
            Self::Json(e) => e.to_string(),
            Self::Io(e) => e.to_string(),
        }
    }

    /// Whether a caller-side retry may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Whether this is a transport timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { timed_out: true, .. })
    }
}

/// Classification carried by a failed payment initiation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network, TLS or timeout failure
    TransportError,
    /// Response did not parse or lacked the redirect URL
    MalformedResponse,
    /// Processor (or local validation) refused the request
    ProcessorRejected,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransportError => "transport_error",
            Self::MalformedResponse => "malformed_response",
            Self::ProcessorRejected => "processor_rejected",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_surfaces_as_rejection() {
        let error = EasypayError::invalid_request("invalid amount");
        assert_eq!(error.failure_kind(), FailureKind::ProcessorRejected);
        assert_eq!(error.detail(), "invalid amount");
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_only_transport_errors_are_retryable() {
        assert!(EasypayError::transport("connection refused").is_retryable());
        assert!(EasypayError::timeout("deadline elapsed").is_retryable());
        assert!(!EasypayError::malformed_response("missing url").is_retryable());
        assert!(!EasypayError::processor_rejected("status 400").is_retryable());
    }

    #[test]
    fn test_timeout_flag() {
        assert!(EasypayError::timeout("deadline elapsed").is_timeout());
        assert!(!EasypayError::transport("reset").is_timeout());
    }

    #[test]
    fn test_json_error_is_malformed() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error = EasypayError::from(err);
        assert_eq!(error.failure_kind(), FailureKind::MalformedResponse);
    }

    #[test]
    fn test_failure_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::TransportError).unwrap();
        assert_eq!(json, "\"transport_error\"");
        assert_eq!(FailureKind::MalformedResponse.to_string(), "malformed_response");
    }
}
