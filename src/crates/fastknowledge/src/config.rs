//! Service configuration.
//!
//! Loaded from the file named by `$FASTKNOWLEDGE_CONFIG` (YAML or JSON,
//! picked by extension), falling back to `config/fastknowledge.yaml`.
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 9000
//! search:
//!   server_url: http://127.0.0.1:7862
//! chat:
//!   default_model: cyou-api
//! prompts_path: prompts.yaml
//! models:
//!   cyou-api:
//!     provider: cyou
//!     client_id: ...
//!     private_key: ...
//!     server_address: http://10.0.0.5:8100
//! ```

use crate::error::Result;
use llm::ModelConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use utils::{get_env_or, load_config_file, RetryPolicy, ServerConfig, UtilsError, ValidateConfig};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "FASTKNOWLEDGE_CONFIG";

/// Configuration file used when the environment variable is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config/fastknowledge.yaml";

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    /// Retry policy for outbound calls (search service and chat models).
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Prompt template file. Relative paths resolve against the directory of
    /// the configuration file.
    #[serde(default = "default_prompts_path")]
    pub prompts_path: PathBuf,

    /// Chat backends keyed by model name.
    #[serde(default)]
    pub models: HashMap<String, ModelConfig>,
}

/// Search service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_url")]
    pub server_url: String,

    /// Number of documents requested per query.
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Distance threshold in `[0, 2]`; lower is stricter.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,

    /// Per-call timeout for search requests, in seconds.
    #[serde(default = "default_search_timeout_secs", alias = "timeout")]
    pub timeout_secs: u64,
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Defaults applied to chat requests that leave a field out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Maximum number of history messages forwarded to the model.
    #[serde(default = "default_history_len")]
    pub history_len: usize,

    /// Timeout applied to every model call, in seconds. Unset leaves each
    /// model's own `timeout_secs` in charge.
    #[serde(default, alias = "request_timeout")]
    pub request_timeout_secs: Option<u64>,
}

impl ChatConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl AppConfig {
    /// Load from `$FASTKNOWLEDGE_CONFIG` or the default path, apply `HOST` /
    /// `PORT` overrides and validate.
    pub fn load() -> Result<Self> {
        let path = get_env_or(CONFIG_ENV_VAR, DEFAULT_CONFIG_PATH);
        Self::from_file(path)
    }

    /// Load and validate a specific configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config: AppConfig = load_config_file(path)?;

        if config.prompts_path.is_relative() {
            if let Some(dir) = path.parent() {
                config.prompts_path = dir.join(&config.prompts_path);
            }
        }
        config.server = config.server.with_env_overrides();
        config.validate()?;

        info!(
            path = %path.display(),
            models = config.models.len(),
            search = %config.search.server_url,
            "Configuration loaded"
        );
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            search: SearchConfig::default(),
            chat: ChatConfig::default(),
            retry: RetryPolicy::default(),
            prompts_path: default_prompts_path(),
            models: HashMap::new(),
        }
    }
}

impl ValidateConfig for AppConfig {
    fn validate(&self) -> utils::Result<()> {
        let invalid = |msg: String| Err(UtilsError::ConfigError(msg));

        if self.search.server_url.trim().is_empty() {
            return invalid("search.server_url must not be empty".to_string());
        }
        if self.search.top_k == 0 {
            return invalid("search.top_k must be at least 1".to_string());
        }
        if !(0.0..=2.0).contains(&self.search.score_threshold) {
            return invalid(format!(
                "search.score_threshold must be between 0 and 2, got {}",
                self.search.score_threshold
            ));
        }
        if self.search.timeout_secs == 0 {
            return invalid("search.timeout_secs must be at least 1".to_string());
        }
        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return invalid(format!(
                "chat.temperature must be between 0.0 and 2.0, got {}",
                self.chat.temperature
            ));
        }
        if !self.models.contains_key(&self.chat.default_model) {
            return invalid(format!(
                "chat.default_model '{}' is not configured under models",
                self.chat.default_model
            ));
        }
        if self.retry.max_attempts == 0 {
            return invalid("retry.max_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            server_url: default_search_url(),
            top_k: default_top_k(),
            score_threshold: default_score_threshold(),
            timeout_secs: default_search_timeout_secs(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            history_len: default_history_len(),
            request_timeout_secs: None,
        }
    }
}

fn default_prompts_path() -> PathBuf {
    PathBuf::from("prompts.yaml")
}

fn default_search_url() -> String {
    "http://127.0.0.1:7862".to_string()
}

fn default_top_k() -> u32 {
    3
}

fn default_score_threshold() -> f64 {
    1.0
}

fn default_model() -> String {
    "cyou-api".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_history_len() -> usize {
    6
}

fn default_search_timeout_secs() -> u64 {
    300
}
