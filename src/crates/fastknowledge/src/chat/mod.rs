//! Chat orchestration.
//!
//! One request makes at most one retrieval call followed by one model call.
//! Nothing here retries; retry policies live in the search client and the
//! model registry.

pub mod citation;

pub use citation::{render_citations, Citation, NO_DOCUMENTS_NOTICE};

use crate::config::{ChatConfig, SearchConfig};
use crate::error::{KnowledgeError, Result};
use crate::history::{HistoryEntry, HistoryFormatter};
use crate::prompt::{PromptStore, RenderVars, DEFAULT_TEMPLATE, EMPTY_TEMPLATE, KNOWLEDGE_BASE_CHAT, LLM_CHAT};
use crate::search::SearchClient;
use llm::{GenerationParams, ModelRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Plain chat request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmChatRequest {
    pub query: String,

    #[serde(default)]
    pub history: Vec<HistoryEntry>,

    #[serde(default)]
    pub model_name: Option<String>,

    #[serde(default)]
    pub temperature: Option<f64>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub prompt_name: Option<String>,
}

/// Knowledge-grounded chat request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeChatRequest {
    pub query: String,

    pub knowledge_base_name: String,

    #[serde(default)]
    pub top_k: Option<u32>,

    #[serde(default)]
    pub score_threshold: Option<f64>,

    #[serde(default)]
    pub history: Vec<HistoryEntry>,

    #[serde(default)]
    pub model_name: Option<String>,

    #[serde(default)]
    pub temperature: Option<f64>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub prompt_name: Option<String>,
}

/// Answer to a plain chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub token_usage: u64,
    pub model_tag: String,
}

/// Answer to a knowledge-grounded chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeAnswer {
    pub answer: String,
    /// Rendered citations, or the single no-documents notice.
    pub docs: Vec<String>,
    pub citations: Vec<Citation>,
    pub token_usage: u64,
}

/// Composes formatting, retrieval and generation.
#[derive(Debug, Clone)]
pub struct ChatService {
    formatter: HistoryFormatter,
    search: SearchClient,
    models: Arc<ModelRegistry>,
    chat_defaults: ChatConfig,
    search_defaults: SearchConfig,
}

impl ChatService {
    pub fn new(
        prompts: Arc<PromptStore>,
        search: SearchClient,
        models: Arc<ModelRegistry>,
        chat_defaults: ChatConfig,
        search_defaults: SearchConfig,
    ) -> Self {
        Self {
            formatter: HistoryFormatter::new(prompts, chat_defaults.history_len),
            search,
            models,
            chat_defaults,
            search_defaults,
        }
    }

    pub fn prompts(&self) -> &Arc<PromptStore> {
        self.formatter.prompts()
    }

    pub fn search(&self) -> &SearchClient {
        &self.search
    }

    pub fn models(&self) -> &Arc<ModelRegistry> {
        &self.models
    }

    /// Chat without retrieval using `llm_chat/<prompt_name>`.
    pub async fn llm_chat(&self, request: &LlmChatRequest) -> Result<ChatAnswer> {
        let params = self.generation_params(request.temperature, request.max_tokens)?;
        let template = request.prompt_name.as_deref().unwrap_or(DEFAULT_TEMPLATE);

        let mut vars = RenderVars::new();
        vars.insert("input", request.query.as_str());
        let messages = self.formatter.format(LLM_CHAT, template, &request.history, &vars)?;

        let start = Instant::now();
        let result = self
            .models
            .generate(request.model_name.as_deref(), &messages, &params)
            .await?;
        info!(
            template,
            messages = messages.len(),
            tokens = result.token_usage,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "llm_chat answered"
        );

        Ok(ChatAnswer {
            answer: result.content,
            token_usage: result.token_usage,
            model_tag: result.model_tag,
        })
    }

    /// Retrieve documents, answer over them and cite them.
    ///
    /// When retrieval finds nothing the `empty` template replaces the
    /// requested one and the citations collapse to the no-documents notice.
    pub async fn knowledge_base_chat(&self, request: &KnowledgeChatRequest) -> Result<KnowledgeAnswer> {
        let params = self.generation_params(request.temperature, request.max_tokens)?;
        let top_k = request.top_k.unwrap_or(self.search_defaults.top_k);
        let score_threshold = request
            .score_threshold
            .unwrap_or(self.search_defaults.score_threshold);

        let start = Instant::now();
        let docs = self
            .search
            .search_docs(&request.query, &request.knowledge_base_name, top_k, score_threshold)
            .await?;
        debug!(
            knowledge_base = %request.knowledge_base_name,
            found = docs.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Documents retrieved"
        );

        let template = if docs.is_empty() {
            EMPTY_TEMPLATE
        } else {
            request.prompt_name.as_deref().unwrap_or(DEFAULT_TEMPLATE)
        };
        let context = docs
            .iter()
            .map(|d| d.page_content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let mut vars = RenderVars::new();
        vars.insert("context", context.as_str());
        vars.insert("question", request.query.as_str());
        let messages = self
            .formatter
            .format(KNOWLEDGE_BASE_CHAT, template, &request.history, &vars)?;

        let start = Instant::now();
        let result = self
            .models
            .generate(request.model_name.as_deref(), &messages, &params)
            .await?;
        info!(
            knowledge_base = %request.knowledge_base_name,
            template,
            documents = docs.len(),
            tokens = result.token_usage,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "knowledge_base_chat answered"
        );

        let citations = Citation::from_documents(&docs, &request.knowledge_base_name, &self.search);
        Ok(KnowledgeAnswer {
            answer: result.content,
            docs: render_citations(&citations),
            citations,
            token_usage: result.token_usage,
        })
    }

    fn generation_params(&self, temperature: Option<f64>, max_tokens: Option<u32>) -> Result<GenerationParams> {
        let temperature = temperature.unwrap_or(self.chat_defaults.temperature);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(KnowledgeError::InvalidRequest(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                temperature
            )));
        }

        let params = GenerationParams::new(temperature)
            .with_max_tokens(max_tokens.unwrap_or(self.chat_defaults.max_tokens));
        Ok(match self.chat_defaults.request_timeout() {
            Some(timeout) => params.with_timeout(timeout),
            None => params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::PromptTemplates;
    use async_trait::async_trait;
    use llm::{ChatMessage, ChatModel, ChatResult, LlmError};
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Records the messages it receives and answers with a fixed text.
    #[derive(Default)]
    struct RecordingModel {
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    #[async_trait]
    impl ChatModel for RecordingModel {
        async fn generate(&self, messages: &[ChatMessage], params: &GenerationParams) -> llm::Result<ChatResult> {
            params.validate()?;
            self.seen.lock().push(messages.to_vec());
            Ok(ChatResult::new("recorded answer", 11, "recording"))
        }

        fn model_tag(&self) -> &str {
            "recording"
        }
    }

    fn templates() -> PromptTemplates {
        let mut llm_chat = HashMap::new();
        llm_chat.insert("default".to_string(), "{{ input }}".to_string());
        let mut kb = HashMap::new();
        kb.insert("default".to_string(), "ctx={{ context }} q={{ question }}".to_string());
        kb.insert("empty".to_string(), "alone: {{ question }}".to_string());

        let mut templates = PromptTemplates::new();
        templates.insert("llm_chat".to_string(), llm_chat);
        templates.insert("knowledge_base_chat".to_string(), kb);
        templates
    }

    fn service(model: Arc<RecordingModel>) -> ChatService {
        let mut registry = ModelRegistry::new();
        registry.register("rec", model).unwrap();
        ChatService::new(
            Arc::new(PromptStore::from_templates(templates())),
            SearchClient::new(&SearchConfig::default()).unwrap(),
            Arc::new(registry.with_default_model("rec")),
            ChatConfig::default(),
            SearchConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_llm_chat_formats_and_generates() {
        let model = Arc::new(RecordingModel::default());
        let service = service(model.clone());

        let answer = service
            .llm_chat(&LlmChatRequest {
                query: "hello".to_string(),
                history: vec![HistoryEntry::new("assistant", "earlier")],
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(answer.answer, "recorded answer");
        assert_eq!(answer.token_usage, 11);
        let seen = model.seen.lock();
        assert_eq!(
            seen[0],
            vec![ChatMessage::assistant("earlier"), ChatMessage::user("hello")]
        );
    }

    #[tokio::test]
    async fn test_unknown_model_is_reported() {
        let service = service(Arc::new(RecordingModel::default()));
        let err = service
            .llm_chat(&LlmChatRequest {
                query: "hi".to_string(),
                model_name: Some("gpt-9".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, KnowledgeError::Llm(LlmError::ModelNotFound(_))));
    }

    #[tokio::test]
    async fn test_temperature_out_of_range() {
        let service = service(Arc::new(RecordingModel::default()));
        let err = service
            .llm_chat(&LlmChatRequest {
                query: "hi".to_string(),
                temperature: Some(2.5),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, KnowledgeError::InvalidRequest(_)));
    }

    #[test]
    fn test_generation_params_use_defaults() {
        let service = service(Arc::new(RecordingModel::default()));
        let params = service.generation_params(None, None).unwrap();
        assert_eq!(params.temperature, 0.7);
        assert_eq!(params.max_tokens, Some(2048));

        let params = service.generation_params(Some(0.1), Some(16)).unwrap();
        assert_eq!(params.temperature, 0.1);
        assert_eq!(params.max_tokens, Some(16));
    }

    #[test]
    fn test_model_timeout_kept_unless_overridden() {
        let service = service(Arc::new(RecordingModel::default()));
        assert_eq!(service.generation_params(None, None).unwrap().timeout, None);

        let mut registry = ModelRegistry::new();
        registry.register("rec", Arc::new(RecordingModel::default())).unwrap();
        let overriding = ChatService::new(
            Arc::new(PromptStore::from_templates(templates())),
            SearchClient::new(&SearchConfig::default()).unwrap(),
            Arc::new(registry.with_default_model("rec")),
            ChatConfig {
                request_timeout_secs: Some(15),
                ..ChatConfig::default()
            },
            SearchConfig::default(),
        );
        assert_eq!(
            overriding.generation_params(None, None).unwrap().timeout,
            Some(std::time::Duration::from_secs(15))
        );
    }
}
