//! OpenAI-compatible chat completions client.
//!
//! Works against any server exposing `POST {base_url}/chat/completions`
//! (OpenAI itself, vLLM, FastChat and similar gateways).
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::remote::OpenAiClient;
//! use llm::config::RemoteLlmConfig;
//! use llm::{ChatMessage, ChatModel, GenerationParams};
//!
//! let config = RemoteLlmConfig::new(api_key, "https://api.openai.com/v1", "gpt-4");
//! let client = OpenAiClient::new(config)?;
//!
//! let result = client
//!     .generate(&[ChatMessage::user("Hello!")], &GenerationParams::default())
//!     .await?;
//! ```

use crate::config::RemoteLlmConfig;
use crate::error::{LlmError, Result};
use crate::message::{ChatMessage, ChatResult, GenerationParams};
use crate::model::ChatModel;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// OpenAI API client.
#[derive(Clone)]
pub struct OpenAiClient {
    config: RemoteLlmConfig,
    client: Client,
}

impl OpenAiClient {
    /// Create a new client with its own connection pool.
    pub fn new(config: RemoteLlmConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| LlmError::ConfigError(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(config, client))
    }

    /// Create a client sharing an existing connection pool.
    pub fn with_client(config: RemoteLlmConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn build_request<'a>(&'a self, messages: &'a [ChatMessage], params: &GenerationParams) -> OpenAiRequest<'a> {
        OpenAiRequest {
            model: &self.config.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            stream: false,
        }
    }

    fn timeout(&self, params: &GenerationParams) -> Duration {
        params.timeout.unwrap_or_else(|| self.config.timeout())
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn generate(&self, messages: &[ChatMessage], params: &GenerationParams) -> Result<ChatResult> {
        params.validate()?;
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = self.build_request(messages, params);
        debug!(url = %url, model = %self.config.model, messages = messages.len(), "Sending chat completion");

        let mut req = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .timeout(self.timeout(params));

        if let Some(org) = &self.config.organization {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "chat completion failed");

            return Err(match status.as_u16() {
                401 => LlmError::AuthenticationError(error_text),
                429 => LlmError::RateLimitExceeded(error_text),
                code => LlmError::TransportError {
                    status: code,
                    body: error_text,
                },
            });
        }

        let text = response.text().await?;
        let parsed: OpenAiResponse = serde_json::from_str(&text)
            .map_err(|e| LlmError::ResponseFormatError(format!("invalid completion: {}", e)))?;

        convert_response(parsed, &self.config.model)
    }

    fn model_tag(&self) -> &str {
        &self.config.model
    }
}

fn convert_response(response: OpenAiResponse, fallback_tag: &str) -> Result<ChatResult> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::ResponseFormatError("completion has no choices".to_string()))?;

    let tokens = response.usage.map(|u| u.total_tokens).unwrap_or(0);
    let tag = response.model.unwrap_or_else(|| fallback_tag.to_string());

    Ok(ChatResult::new(
        choice.message.content.unwrap_or_default(),
        tokens,
        tag,
    ))
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    total_tokens: u64,
}
