//! Error types for the knowledge chat service.

use llm::{LlmError, UnsupportedRole};
use thiserror::Error;

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, KnowledgeError>;

/// Errors raised while formatting prompts, retrieving documents or chatting.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// No template is configured under `scenario/name`.
    #[error("Prompt template not found: {scenario}/{name}")]
    TemplateNotFound { scenario: String, name: String },

    /// A history entry carries a role outside `{system, user, assistant}`.
    #[error("Unsupported role: {0}")]
    UnsupportedRole(String),

    /// The search service answered with a non-success status or unparsable JSON.
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// The search service could not be reached.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A chat model backend failed.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Request parameters failed validation.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KnowledgeError {
    /// Whether another attempt at the same outbound call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            KnowledgeError::Transport(_) => true,
            KnowledgeError::Llm(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<UnsupportedRole> for KnowledgeError {
    fn from(err: UnsupportedRole) -> Self {
        KnowledgeError::UnsupportedRole(err.0)
    }
}

impl From<utils::UtilsError> for KnowledgeError {
    fn from(err: utils::UtilsError) -> Self {
        KnowledgeError::Config(err.to_string())
    }
}
