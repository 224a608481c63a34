//! Error types for chat model backends.

use thiserror::Error;

/// Result type for LLM operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur when calling a chat model backend.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Connection-level failure (DNS, refused, timeout, broken body).
    ///
    /// Together with [`LlmError::TransportError`] this forms the transport
    /// class: this variant covers calls that never got a status line, the
    /// other covers non-success statuses. [`LlmError::is_retryable`] decides
    /// for both.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The remote answered with a non-success HTTP status.
    #[error("Transport error: HTTP {status}: {body}")]
    TransportError {
        /// HTTP status code returned by the remote.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response envelope does not have the expected shape.
    #[error("Response format error: {0}")]
    ResponseFormatError(String),

    /// Failed to serialize the request body.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// API authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// No backend is registered under the requested model name.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl LlmError {
    /// Check if this error is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::HttpError(e) => e.is_timeout() || e.is_connect(),
            LlmError::TransportError { status, .. } => *status >= 500,
            LlmError::RateLimitExceeded(_) => true,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::SerializationError(err.to_string())
    }
}
