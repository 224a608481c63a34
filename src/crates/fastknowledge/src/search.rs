//! Client for the external document search service.
//!
//! The service is an opaque HTTP collaborator exposing
//! `/knowledge_base/{search_docs, check_str_like, set_qa_into_db, download_doc}`.
//! Calls go through the injected [`RetryPolicy`]; only transport failures
//! are retried.

use crate::config::SearchConfig;
use crate::error::{KnowledgeError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Instant;
use tracing::{debug, warn};
use utils::{with_retry_if, RetryPolicy};

/// A retrieved document with its distance score (lower is closer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentWithScore {
    pub page_content: String,

    #[serde(default)]
    pub metadata: Map<String, Value>,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default = "default_score")]
    pub score: f64,
}

impl DocumentWithScore {
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: Map::new(),
            id: None,
            score: default_score(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.metadata
            .insert("source".to_string(), Value::String(source.into()));
        self
    }

    /// File name from `metadata.source`, or `""` when absent.
    pub fn source(&self) -> &str {
        self.metadata
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

fn default_score() -> f64 {
    3.0
}

#[derive(Serialize)]
struct SearchDocsRequest<'a> {
    query: &'a str,
    knowledge_base_name: &'a str,
    top_k: u32,
    score_threshold: f64,
}

#[derive(Serialize)]
struct CheckStrLikeRequest<'a> {
    query: &'a str,
    score_threshold: f64,
}

#[derive(Serialize)]
struct SetQaRequest<'a> {
    query: &'a str,
    answer: &'a str,
}

/// HTTP client for the search service.
#[derive(Debug, Clone)]
pub struct SearchClient {
    base_url: String,
    client: Client,
    retry: RetryPolicy,
}

impl SearchClient {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| KnowledgeError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(config, client))
    }

    /// Create a client sharing an existing connection pool.
    pub fn with_client(config: &SearchConfig, client: Client) -> Self {
        Self {
            base_url: config.server_url.trim_end_matches('/').to_string(),
            client,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Top-K documents for `query`, in rank order. An empty list is a valid
    /// result.
    pub async fn search_docs(
        &self,
        query: &str,
        knowledge_base_name: &str,
        top_k: u32,
        score_threshold: f64,
    ) -> Result<Vec<DocumentWithScore>> {
        check_threshold(score_threshold)?;
        let body = SearchDocsRequest {
            query,
            knowledge_base_name,
            top_k,
            score_threshold,
        };

        let start = Instant::now();
        let raw = self.post_json("/knowledge_base/search_docs", &body).await?;
        let docs: Vec<DocumentWithScore> = serde_json::from_value(raw)
            .map_err(|e| KnowledgeError::Retrieval(format!("malformed search response: {}", e)))?;

        debug!(
            knowledge_base = knowledge_base_name,
            top_k,
            found = docs.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search_docs completed"
        );
        Ok(docs)
    }

    /// Similar cached questions and their answers, as returned by the service.
    pub async fn check_str_like(&self, query: &str, score_threshold: f64) -> Result<Value> {
        check_threshold(score_threshold)?;
        self.post_json(
            "/knowledge_base/check_str_like",
            &CheckStrLikeRequest {
                query,
                score_threshold,
            },
        )
        .await
    }

    /// Store a question/answer pair in the service's cache.
    pub async fn set_qa_into_db(&self, query: &str, answer: &str) -> Result<Value> {
        self.post_json("/knowledge_base/set_qa_into_db", &SetQaRequest { query, answer })
            .await
    }

    /// Download link for a file in a knowledge base.
    pub fn download_url(&self, knowledge_base_name: &str, file_name: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("knowledge_base_name", knowledge_base_name)
            .append_pair("file_name", file_name)
            .finish();
        format!("{}/knowledge_base/download_doc?{}", self.base_url, query)
    }

    async fn post_json<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        with_retry_if(&self.retry, path, KnowledgeError::is_retryable, || {
            self.post_once(&url, body)
        })
        .await
    }

    async fn post_once<B: Serialize + Sync>(&self, url: &str, body: &B) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| KnowledgeError::Transport(format!("{}: {}", url, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| KnowledgeError::Transport(format!("{}: {}", url, e)))?;

        if !status.is_success() {
            warn!(url, status = status.as_u16(), "Search service returned an error status");
            return Err(KnowledgeError::Retrieval(format!(
                "HTTP {} from {}: {}",
                status.as_u16(),
                url,
                text
            )));
        }

        serde_json::from_str(&text)
            .map_err(|e| KnowledgeError::Retrieval(format!("invalid JSON from {}: {}", url, e)))
    }
}

fn check_threshold(score_threshold: f64) -> Result<()> {
    if !(0.0..=2.0).contains(&score_threshold) {
        return Err(KnowledgeError::InvalidRequest(format!(
            "score_threshold must be between 0 and 2, got {}",
            score_threshold
        )));
    }
    Ok(())
}
