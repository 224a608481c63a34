//! Chat message, result and generation parameter types shared by all backends.

use crate::error::{LlmError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Role of a chat message. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role string outside `{system, user, assistant}`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported role: {0}")]
pub struct UnsupportedRole(pub String);

impl FromStr for Role {
    type Err = UnsupportedRole;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(UnsupportedRole(other.to_string())),
        }
    }
}

/// One role-tagged message.
///
/// Serializes as `{"role": ..., "content": ...}` in that key order, which is
/// the order the signed gateway hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: Role,
    content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Uniform result of a chat generation.
///
/// Remote-reported application errors from the cyou gateway are carried here
/// as ordinary content (`error_code:<status> error_message:<message>`) with a
/// token usage of zero. Callers that care must inspect the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResult {
    pub content: String,
    pub token_usage: u64,
    pub model_tag: String,
}

impl ChatResult {
    pub fn new(content: impl Into<String>, token_usage: u64, model_tag: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            token_usage,
            model_tag: model_tag.into(),
        }
    }

    /// Result describing an error the remote reported inside a success envelope.
    pub fn remote_error(status: &str, message: &str, model_tag: impl Into<String>) -> Self {
        Self::new(
            format!("error_code:{} error_message:{}", status, message),
            0,
            model_tag,
        )
    }
}

/// Sampling and transport parameters for one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// Sampling temperature, `0.0..=2.0`.
    pub temperature: f64,

    /// Upper bound on generated tokens, for backends that honour it.
    pub max_tokens: Option<u32>,

    /// Per-call timeout. Falls back to the backend's configured timeout.
    pub timeout: Option<Duration>,
}

impl GenerationParams {
    pub fn new(temperature: f64) -> Self {
        Self {
            temperature,
            max_tokens: None,
            timeout: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Reject temperatures outside `0.0..=2.0`.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(LlmError::InvalidRequest(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::new(0.7)
    }
}
