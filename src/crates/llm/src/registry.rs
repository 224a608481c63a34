//! Model registry mapping configured model names to chat backends.
//!
//! The registry is assembled once at startup and shared read-only behind an
//! `Arc`. All backends built from configuration share one `reqwest::Client`
//! connection pool.

use crate::config::ModelConfig;
use crate::error::{LlmError, Result};
use crate::message::{ChatMessage, ChatResult, GenerationParams};
use crate::model::ChatModel;
use crate::remote::{CyouClient, OpenAiClient};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use utils::{with_retry_if, RetryPolicy};

/// Named chat backends plus the default model and retry policy.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<dyn ChatModel>>,
    default_model: Option<String>,
    retry: RetryPolicy,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every configured backend.
    ///
    /// OpenAI-compatible entries without an explicit upstream `model` use
    /// their registry name.
    pub fn from_configs<'a, I>(configs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a ModelConfig)>,
    {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| LlmError::ConfigError(format!("failed to build HTTP client: {}", e)))?;

        let mut registry = Self::new();
        for (name, config) in configs {
            let model: Arc<dyn ChatModel> = match config.clone() {
                ModelConfig::Cyou(cfg) => Arc::new(CyouClient::with_client(cfg, client.clone())),
                ModelConfig::Openai(mut cfg) => {
                    if cfg.model.is_empty() {
                        cfg.model = name.clone();
                    }
                    Arc::new(OpenAiClient::with_client(cfg, client.clone()))
                }
            };
            registry.register(name.clone(), model)?;
        }

        info!(models = ?registry.model_names(), "Model registry initialized");
        Ok(registry)
    }

    /// Register a backend under `name`. Names must be unique.
    pub fn register(&mut self, name: impl Into<String>, model: Arc<dyn ChatModel>) -> Result<()> {
        let name = name.into();
        if self.models.contains_key(&name) {
            return Err(LlmError::ConfigError(format!(
                "model '{}' already registered",
                name
            )));
        }
        debug!(model = %name, tag = model.model_tag(), "Registered chat model");
        self.models.insert(name, model);
        Ok(())
    }

    /// Set the model used when a request names none.
    pub fn with_default_model(mut self, name: impl Into<String>) -> Self {
        self.default_model = Some(name.into());
        self
    }

    /// Set the retry policy applied by [`ModelRegistry::generate`].
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn default_model(&self) -> Option<&str> {
        self.default_model.as_deref()
    }

    /// Look up a backend by exact name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn ChatModel>> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| LlmError::ModelNotFound(name.to_string()))
    }

    /// Look up `name`, falling back to the default model when `None`.
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn ChatModel>> {
        match name.or(self.default_model.as_deref()) {
            Some(name) => self.get(name),
            None => Err(LlmError::ModelNotFound(
                "no model requested and no default configured".to_string(),
            )),
        }
    }

    /// Registered model names, sorted.
    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolve a backend and generate, retrying transient failures under the
    /// registry's policy.
    pub async fn generate(
        &self,
        model_name: Option<&str>,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<ChatResult> {
        let model = self.resolve(model_name)?;
        with_retry_if(&self.retry, "llm.generate", LlmError::is_retryable, || {
            model.generate(messages, params)
        })
        .await
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.model_names())
            .field("default_model", &self.default_model)
            .field("retry", &self.retry)
            .finish()
    }
}
