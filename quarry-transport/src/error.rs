//! Transport error types.

use std::time::Duration;
use thiserror::Error;

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Failure to complete an HTTP exchange.
///
/// A reply with an error status is *not* a transport failure; the exchange
/// completed and the status travels back in [`RawResponse`](crate::RawResponse).
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request timed out at the transport.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection could not be established or was dropped.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid base URL or path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Request could not be assembled.
    #[error("Failed to build request: {0}")]
    RequestBuild(String),

    /// Underlying HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Failure injected by [`StubTransport`](crate::StubTransport).
    #[error("Stub transport failure: {0}")]
    Stub(String),
}

impl TransportError {
    /// Classify a failed send. Connect failures and timeouts get their own
    /// variants; anything else keeps the reqwest error.
    pub(crate) fn from_exchange(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Http(err)
        }
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_)) || matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// Check if this is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_)) || matches!(self, Self::Http(e) if e.is_connect())
    }

    /// Whether the caller may reasonably retry the same call.
    ///
    /// The client core never retries on its own.
    pub fn is_retryable(&self) -> bool {
        self.is_timeout() || self.is_connection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_retryable() {
        let err = TransportError::Timeout(Duration::from_secs(1));
        assert!(err.is_timeout());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_invalid_url_is_not_retryable() {
        let err = TransportError::InvalidUrl("nope".to_string());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("nope"));
    }
}
