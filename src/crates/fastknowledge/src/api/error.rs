//! API error type and its `{code, msg}` response body.

use crate::error::KnowledgeError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use llm::LlmError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub msg: String,
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A chat endpoint failed.
    #[error("Knowledge base query failed: {0}")]
    ChatFailed(#[source] KnowledgeError),

    /// A passthrough or maintenance endpoint failed.
    #[error(transparent)]
    Service(#[from] KnowledgeError),

    /// The request could not be decoded.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The whole-request deadline expired.
    #[error("Request timed out")]
    Timeout,

    /// Failure outside the handlers.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ChatFailed(e) | ApiError::Service(e) => status_for(e),
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn status_for(err: &KnowledgeError) -> StatusCode {
    match err {
        KnowledgeError::InvalidRequest(_) | KnowledgeError::UnsupportedRole(_) => StatusCode::BAD_REQUEST,
        KnowledgeError::TemplateNotFound { .. } => StatusCode::NOT_FOUND,
        KnowledgeError::Retrieval(_) | KnowledgeError::Transport(_) => StatusCode::BAD_GATEWAY,
        KnowledgeError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        KnowledgeError::Llm(e) => match e {
            LlmError::ModelNotFound(_) => StatusCode::NOT_FOUND,
            LlmError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            LlmError::HttpError(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            LlmError::ConfigError(_) | LlmError::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        },
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            code: status.as_u16(),
            msg: self.to_string(),
        };

        tracing::error!(code = body.code, msg = %body.msg, "API error");

        (status, Json(body)).into_response()
    }
}
