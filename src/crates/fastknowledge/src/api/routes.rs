//! API route definitions

use crate::api::{handlers, middleware};
use crate::chat::ChatService;
use axum::{
    error_handling::HandleErrorLayer,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use utils::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    /// Threshold used by `check_str_like` when the query string omits one.
    pub default_score_threshold: f64,
}

impl AppState {
    pub fn new(chat: Arc<ChatService>, default_score_threshold: f64) -> Self {
        Self {
            chat,
            default_score_threshold,
        }
    }
}

/// Build the complete API router
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health))
        // Chat endpoints
        .route("/chat/knowledge_base_chat", post(handlers::knowledge_base_chat))
        .route("/chat/llm_chat", post(handlers::llm_chat))
        // Search service passthrough
        .route("/chat/check_str_like", get(handlers::check_str_like))
        .route("/chat/set_qa_into_db", post(handlers::set_qa_into_db))
        // Maintenance
        .route("/prompts/reload", post(handlers::reload_prompts))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(middleware::handle_layer_error))
                .timeout(server.timeout()),
        )
        .layer(middleware::logging_layer());

    if server.enable_cors {
        router.layer(middleware::cors_layer())
    } else {
        router
    }
}
