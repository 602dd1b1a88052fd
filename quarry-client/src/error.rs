//! Error types for client operations.

use crate::registry::RegistryError;
use quarry_transport::TransportError;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Client error type.
///
/// A failed call yields exactly one of these; branch on [`Error::kind`]
/// rather than on the message.
#[derive(Error, Debug)]
pub enum Error {
    /// Request was malformed and never reached the transport.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport could not complete the exchange.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Exchange completed but the service reported a failure.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// Successful reply did not match the expected shape.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Processor discriminator not in the registry, under the reject policy.
    #[error("Unknown processor type: {name}")]
    UnknownVariant {
        /// The unrecognized discriminator.
        name: String,
    },

    /// Call was cancelled or exceeded its deadline.
    #[error("Request cancelled")]
    Cancelled,

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid processor registration.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`Error::Validation`].
    Validation,
    /// See [`Error::Transport`].
    Transport,
    /// See [`Error::Server`].
    Server,
    /// See [`Error::Decode`].
    Decode,
    /// See [`Error::UnknownVariant`].
    UnknownVariant,
    /// See [`Error::Cancelled`].
    Cancelled,
    /// See [`Error::Config`].
    Config,
    /// See [`Error::Registry`].
    Registry,
}

impl Error {
    /// Get the error classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Server(_) => ErrorKind::Server,
            Self::Decode(_) => ErrorKind::Decode,
            Self::UnknownVariant { .. } => ErrorKind::UnknownVariant,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config(_) => ErrorKind::Config,
            Self::Registry(_) => ErrorKind::Registry,
        }
    }

    /// Get the HTTP status code if the service replied with an error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Server(e) => Some(e.status),
            _ => None,
        }
    }

    /// Check if the same call could succeed when sent again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            Self::Server(e) => matches!(e.status, 429 | 502 | 503 | 504),
            _ => false,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Error reply from the service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerError {
    /// HTTP status code.
    pub status: u16,
    /// Raw reply body.
    pub body: String,
    /// Structured cause, when the body carries one.
    pub cause: Option<ErrorCause>,
}

/// The `error` object of a service error reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCause {
    /// Error type, e.g. `resource_not_found_exception`.
    pub error_type: Option<String>,
    /// Human readable reason.
    pub reason: Option<String>,
}

impl ServerError {
    /// Build from a raw reply, extracting the cause when present.
    pub fn from_reply(status: u16, body: &[u8]) -> Self {
        let body = String::from_utf8_lossy(body).into_owned();
        let cause = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| ErrorCause::from_value(v.get("error")?));

        Self {
            status,
            body,
            cause,
        }
    }

    /// Reason reported by the service, if any.
    pub fn reason(&self) -> Option<&str> {
        self.cause.as_ref().and_then(|c| c.reason.as_deref())
    }
}

impl ErrorCause {
    fn from_value(error: &Value) -> Option<Self> {
        match error {
            // Older releases report a bare string.
            Value::String(reason) => Some(Self {
                error_type: None,
                reason: Some(reason.clone()),
            }),
            Value::Object(_) => Some(Self {
                error_type: error
                    .get("type")
                    .and_then(|t| t.as_str())
                    .map(str::to_string),
                reason: error
                    .get("reason")
                    .and_then(|r| r.as_str())
                    .map(str::to_string),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "Server returned {}: {}", self.status, reason),
            None => write!(f, "Server returned {}: {}", self.status, self.body),
        }
    }
}

impl std::error::Error for ServerError {}

/// Reply body that could not be mapped onto the expected shape.
#[derive(Error, Debug)]
#[error("Failed to decode {shape}: {source}")]
pub struct DecodeError {
    /// Name of the expected type.
    pub shape: &'static str,
    /// Underlying serde error.
    #[source]
    pub source: serde_json::Error,
}

impl DecodeError {
    pub(crate) fn new<T>(source: serde_json::Error) -> Self {
        Self {
            shape: std::any::type_name::<T>(),
            source,
        }
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
