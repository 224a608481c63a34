//! Knowledge-base chat backend.
//!
//! Forwards chat requests to a remote LLM and to an external document search
//! service, merges the results and serves them as JSON.
//!
//! # Components
//!
//! - [`prompt`] - hot-reloadable prompt templates and `{{ name }}` rendering
//! - [`history`] - conversation history and the history-to-messages formatter
//! - [`search`] - client for the document search service
//! - [`chat`] - orchestration of retrieval, formatting and generation
//! - [`api`] - the axum HTTP surface
//!
//! Model backends (the signed cyou gateway and OpenAI-compatible servers) live
//! in the `llm` crate.
//!
//! # Example
//!
//! ```rust,ignore
//! use fastknowledge::{app, config::AppConfig};
//!
//! let config = AppConfig::load()?;
//! let router = app::build_router(&config)?;
//! let listener = tokio::net::TcpListener::bind(config.server.socket_addr()?).await?;
//! axum::serve(listener, router).await?;
//! ```

pub mod api;
pub mod app;
pub mod chat;
pub mod config;
pub mod error;
pub mod history;
pub mod prompt;
pub mod search;

pub use chat::{ChatService, KnowledgeChatRequest, LlmChatRequest};
pub use config::AppConfig;
pub use error::{KnowledgeError, Result};
pub use history::{ConversationHistory, HistoryEntry, HistoryFormatter};
pub use prompt::PromptStore;
pub use search::{DocumentWithScore, SearchClient};
