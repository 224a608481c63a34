//! Wiring from configuration to a ready router.

use crate::api::{create_router, AppState};
use crate::chat::ChatService;
use crate::config::AppConfig;
use crate::error::Result;
use crate::prompt::PromptStore;
use crate::search::SearchClient;
use axum::Router;
use llm::ModelRegistry;
use std::sync::Arc;
use tracing::info;

/// Build the chat service: prompt store, search client and model registry,
/// all sharing the configured retry policy.
pub fn build_chat_service(config: &AppConfig) -> Result<ChatService> {
    let prompts = Arc::new(PromptStore::from_file(&config.prompts_path)?);

    let search = SearchClient::new(&config.search)?.with_retry_policy(config.retry.clone());

    let models = ModelRegistry::from_configs(&config.models)?
        .with_default_model(config.chat.default_model.clone())
        .with_retry_policy(config.retry.clone());

    info!(
        default_model = %config.chat.default_model,
        max_attempts = config.retry.max_attempts,
        "Chat service ready"
    );

    Ok(ChatService::new(
        prompts,
        search,
        Arc::new(models),
        config.chat.clone(),
        config.search.clone(),
    ))
}

/// Build the full HTTP router for `config`.
pub fn build_router(config: &AppConfig) -> Result<Router> {
    let chat = build_chat_service(config)?;
    let state = AppState::new(Arc::new(chat), config.search.score_threshold);
    Ok(create_router(state, &config.server))
}
