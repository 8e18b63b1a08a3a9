//! Google API error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for Google API operations.
pub type GoogleResult<T> = Result<T, GoogleError>;

/// Default wait when a 429 carries no Retry-After header.
const DEFAULT_RATE_LIMIT_MS: u64 = 1000;

/// Errors that can occur while talking to Google APIs.
#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Credentials file not found: {0}")]
    MissingCredentials(PathBuf),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Rate limited, retry after {0}ms")]
    RateLimited(u64),

    #[error("Server error {0}: {1}")]
    ServerError(u16, String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GoogleError {
    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_http_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Self::AuthError(message),
            403 => Self::PermissionDenied(message),
            404 => Self::NotFound(message),
            429 => Self::RateLimited(DEFAULT_RATE_LIMIT_MS),
            500..=599 => Self::ServerError(status, message),
            _ => Self::RequestFailed(message),
        }
    }

    /// Replace the rate-limit wait with a server-provided value.
    pub fn with_retry_after(self, retry_after_ms: Option<u64>) -> Self {
        match (self, retry_after_ms) {
            (Self::RateLimited(_), Some(ms)) => Self::RateLimited(ms),
            (err, _) => err,
        }
    }

    /// HTTP status this error was built from, when known.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::AuthError(_) => Some(401),
            Self::PermissionDenied(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::RateLimited(_) => Some(429),
            Self::ServerError(status, _) => Some(*status),
            _ => None,
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::ServerError(..) => true,
            Self::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimited(ms) => Some(*ms),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_http_status_429() {
        let err = GoogleError::from_http_status(429, "rate limited");
        assert!(matches!(err, GoogleError::RateLimited(_)));
        assert!(err.is_retryable());
        assert_eq!(err.retry_after_ms(), Some(DEFAULT_RATE_LIMIT_MS));
    }

    #[test]
    fn test_error_from_http_status_5xx() {
        let err = GoogleError::from_http_status(503, "unavailable");
        assert!(matches!(err, GoogleError::ServerError(503, _)));
        assert!(err.is_retryable());
        assert_eq!(err.http_status(), Some(503));
    }

    #[test]
    fn test_error_from_http_status_4xx_not_retryable() {
        assert!(matches!(GoogleError::from_http_status(400, "bad"), GoogleError::RequestFailed(_)));
        assert!(matches!(GoogleError::from_http_status(403, "no"), GoogleError::PermissionDenied(_)));
        assert!(matches!(GoogleError::from_http_status(404, "gone"), GoogleError::NotFound(_)));
        assert!(!GoogleError::from_http_status(404, "gone").is_retryable());
        assert!(!GoogleError::from_http_status(401, "expired").is_retryable());
    }

    #[test]
    fn test_with_retry_after_only_touches_rate_limit() {
        let err = GoogleError::from_http_status(429, "slow down").with_retry_after(Some(3000));
        assert_eq!(err.retry_after_ms(), Some(3000));

        let err = GoogleError::from_http_status(500, "boom").with_retry_after(Some(3000));
        assert_eq!(err.retry_after_ms(), None);
    }
}
