//! Error types for the HTTP adapter.

use ink_core::CapabilityError;
use thiserror::Error;

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors that can occur when talking to the backend services.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The base URL provided by configuration is invalid.
    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),

    /// HTTP layer failed (connection, timeout, etc.).
    #[error("backend HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed unexpectedly.
    #[error("failed to parse backend payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, or the canonical reason.
        message: String,
    },

    /// The response did not match the expected structure.
    #[error("unexpected backend response: {0}")]
    UnexpectedResponse(String),
}

impl RemoteError {
    /// Returns true if the service could not be reached or failed on its side.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Self::Status { status, .. } => *status >= 500,
            Self::InvalidUrl(_) | Self::Json(_) | Self::UnexpectedResponse(_) => false,
        }
    }

    /// Convert into the engine's transport-agnostic error for `service`.
    #[must_use]
    pub fn into_capability(self, service: &'static str) -> CapabilityError {
        if self.is_transient() {
            CapabilityError::unavailable(service, self.to_string())
        } else {
            CapabilityError::rejected(service, self.to_string())
        }
    }
}
