//! Errors raised while talking to an upstream backend.
//!
//! These never cross the relay boundary: [`crate::relay::Relay`] and
//! [`crate::fallback::FallbackRouter`] fold them into a
//! [`crate::outcome::FailureKind`] before anything reaches a caller.
use axum::http::StatusCode;
use std::time::Duration;

/// A failed exchange with a backend.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The outbound request could not be constructed.
    #[error("failed to build request for {url}: {reason}")]
    InvalidRequest { url: String, reason: String },

    /// The connection failed before a response arrived.
    #[error("request to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No complete response within the configured deadline.
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// The backend answered with a non-success status.
    #[error("{url} returned status {status}")]
    Status { url: String, status: StatusCode },

    /// The response body could not be read.
    #[error("failed to read response body from {url}: {reason}")]
    Body { url: String, reason: String },

    /// The body was read but did not match the expected shape.
    #[error("malformed response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TransportError {
    /// True when the backend could not be reached at all (refused, reset, DNS).
    pub fn is_connect(&self) -> bool {
        matches!(self, TransportError::Connect { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }

    /// The upstream status, if the backend answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
