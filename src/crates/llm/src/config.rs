//! Configuration structures for chat model backends.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default path of the cyou chat endpoint on the gateway.
pub const DEFAULT_CYOU_API_PATH: &str = "/cyouNeiOpenAi/api/chatGpt";

/// Configuration for the signed cyou LLM gateway.
#[derive(Clone, Serialize, Deserialize)]
pub struct CyouConfig {
    /// Client identifier issued by the gateway.
    pub client_id: String,

    /// Shared secret mixed into every signature. Never logged.
    pub private_key: String,

    /// Gateway base address, e.g. `http://10.0.0.5:8100`.
    pub server_address: String,

    /// Path of the chat endpoint. Part of the signed material.
    #[serde(default = "default_cyou_api_path")]
    pub api_path: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl CyouConfig {
    /// Create a new gateway configuration with the default api path.
    pub fn new(
        client_id: impl Into<String>,
        private_key: impl Into<String>,
        server_address: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            private_key: private_key.into(),
            server_address: server_address.into(),
            api_path: default_cyou_api_path(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Set the api path.
    pub fn with_api_path(mut self, api_path: impl Into<String>) -> Self {
        self.api_path = api_path.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full endpoint URL.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.server_address.trim_end_matches('/'), self.api_path)
    }
}

impl std::fmt::Debug for CyouConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CyouConfig")
            .field("client_id", &self.client_id)
            .field("private_key", &"<redacted>")
            .field("server_address", &self.server_address)
            .field("api_path", &self.api_path)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Configuration for OpenAI-compatible providers.
#[derive(Clone, Serialize, Deserialize)]
pub struct RemoteLlmConfig {
    /// API key for bearer authentication.
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// Base URL for the API, e.g. `https://api.openai.com/v1`.
    pub base_url: String,

    /// Model identifier sent upstream. Empty means "use the registry name".
    #[serde(default)]
    pub model: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Organization ID (optional).
    #[serde(default)]
    pub organization: Option<String>,
}

impl RemoteLlmConfig {
    /// Create a new remote LLM configuration.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            timeout_secs: default_timeout_secs(),
            organization: None,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for RemoteLlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteLlmConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("organization", &self.organization)
            .finish()
    }
}

/// One entry of the model registry, tagged by backend.
///
/// ```yaml
/// cyou-api:
///   provider: cyou
///   client_id: ...
///   private_key: ...
///   server_address: http://10.0.0.5:8100
/// gpt-4:
///   provider: openai
///   base_url: https://api.openai.com/v1
///   api_key: sk-...
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ModelConfig {
    Cyou(CyouConfig),
    Openai(RemoteLlmConfig),
}

fn default_cyou_api_path() -> String {
    DEFAULT_CYOU_API_PATH.to_string()
}

fn default_api_key() -> String {
    "EMPTY".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}
