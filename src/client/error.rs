//! Error types for backend API calls.

use thiserror::Error;

/// Errors that can occur when calling the risk backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Request exceeded its deadline.
    #[error("request timeout after {0}ms")]
    Timeout(u64),

    /// Network connectivity error (DNS, connection refused, reset).
    #[error("network error: {0}")]
    Network(String),

    /// Backend returned a non-success status.
    #[error("backend error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Backend response doesn't match the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Request could not be built (bad base URL, bad path segment).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Classify a reqwest error against the timeout that was in force.
    pub fn from_reqwest(e: reqwest::Error, timeout_ms: u64) -> Self {
        if e.is_timeout() {
            ClientError::Timeout(timeout_ms)
        } else if e.is_decode() {
            ClientError::InvalidResponse(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }

    /// True for failures where the backend could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ClientError::Timeout(_) | ClientError::Network(_))
    }
}
