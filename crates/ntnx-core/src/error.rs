//! Error types for Acropolis operations.
//!
//! Every failure surfaced by the clients in this workspace is one of the
//! [`Error`] variants below. Transport and decoding failures are never
//! swallowed; they are converted and propagated to the caller.

use thiserror::Error;

/// Main error type for Acropolis operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A mutating request was answered with a status other than 200
    #[error("Request failed with status {status}: {message}")]
    RequestFailed {
        /// HTTP status code returned by the server
        status: u16,
        /// Description naming the entities involved
        message: String,
    },

    /// Operation did not complete before its deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Operation was cancelled by the caller
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// More than one resource matched a lookup that requires a single match
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Response body could not be decoded
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Response decoded but did not contain what the operation requires
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Prism endpoint is unreachable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid identifier
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Specialized result type for Acropolis operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::RequestFailed { .. } => "REQUEST_FAILED",
            Self::Timeout(_) => "TIMEOUT",
            Self::Cancelled(_) => "CANCELLED",
            Self::Conflict(_) => "CONFLICT",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::InvalidResponse(_) => "INVALID_RESPONSE",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::InvalidId(_) => "INVALID_ID",
            Self::ValidationError(_) => "VALIDATION_ERROR",
        }
    }

    /// Builds a [`Error::RequestFailed`] from a status code and message.
    #[must_use]
    pub fn request_failed(status: u16, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            message: message.into(),
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::ConfigError(_) | Self::ParseError(_) | Self::ServiceUnavailable(_)
        )
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::NotFound("x".to_string()).error_code(), "NOT_FOUND");
        assert_eq!(
            Error::request_failed(500, "x").error_code(),
            "REQUEST_FAILED"
        );
        assert_eq!(Error::Timeout("x".to_string()).error_code(), "TIMEOUT");
        assert_eq!(Error::Cancelled("x".to_string()).error_code(), "CANCELLED");
        assert_eq!(Error::Conflict("x".to_string()).error_code(), "CONFLICT");
        assert_eq!(
            Error::ParseError("x".to_string()).error_code(),
            "PARSE_ERROR"
        );
        assert_eq!(
            Error::InvalidResponse("x".to_string()).error_code(),
            "INVALID_RESPONSE"
        );
        assert_eq!(Error::InvalidId("x".to_string()).error_code(), "INVALID_ID");
    }

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("Image ubuntu".to_string());
        assert_eq!(err.to_string(), "Not found: Image ubuntu");

        let err = Error::request_failed(
            500,
            "Image ubuntu could not be cloned for VM web-01",
        );
        assert_eq!(
            err.to_string(),
            "Request failed with status 500: Image ubuntu could not be cloned for VM web-01"
        );
    }

    #[test]
    fn test_should_log() {
        assert!(Error::ConfigError("test".to_string()).should_log());
        assert!(Error::ParseError("test".to_string()).should_log());
        assert!(!Error::NotFound("test".to_string()).should_log());
        assert!(!Error::Timeout("test".to_string()).should_log());
    }

    #[test]
    fn test_from_url_parse_error() {
        let err = url::Url::parse("not a url").unwrap_err();
        let converted: Error = err.into();
        assert!(matches!(converted, Error::InvalidEndpoint(_)));
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let converted: Error = err.into();
        assert!(matches!(converted, Error::ParseError(_)));
    }

    #[test]
    fn test_error_partial_eq() {
        let err1 = Error::NotFound("test".to_string());
        let err2 = Error::NotFound("test".to_string());
        let err3 = Error::NotFound("other".to_string());

        assert_eq!(err1, err2.clone());
        assert_ne!(err1, err3);
    }
}
