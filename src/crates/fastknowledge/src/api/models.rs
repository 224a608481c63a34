//! Request and response bodies of the HTTP API.
//!
//! Chat request bodies are the service's own request types.

pub use crate::chat::{KnowledgeChatRequest, LlmChatRequest};

use serde::{Deserialize, Serialize};

/// Response of `POST /chat/knowledge_base_chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChatResponse {
    pub code: u16,
    pub answer: String,
    pub docs: Vec<String>,
}

impl KnowledgeChatResponse {
    pub fn new(answer: String, docs: Vec<String>) -> Self {
        Self {
            code: 200,
            answer,
            docs,
        }
    }
}

/// Response of `POST /chat/llm_chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmChatResponse {
    pub answer: String,
}

/// Query string of `GET /chat/check_str_like`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckStrLikeQuery {
    pub query: String,
    #[serde(default)]
    pub score_threshold: Option<f64>,
}

/// Body of `POST /chat/set_qa_into_db`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetQaRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub answer: String,
}

/// Response of `POST /prompts/reload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub version: u64,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub prompt_version: u64,
    pub models: Vec<String>,
    pub version: String,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn new(prompt_version: u64, models: Vec<String>) -> Self {
        Self {
            status: "ok".to_string(),
            prompt_version,
            models,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
