//! Endpoint handlers.

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{
    CheckStrLikeQuery, HealthResponse, KnowledgeChatRequest, KnowledgeChatResponse, LlmChatRequest,
    LlmChatResponse, ReloadResponse, SetQaRequest,
};
use crate::api::routes::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde_json::Value;
use tracing::info;

/// Handler for POST /chat/knowledge_base_chat
pub async fn knowledge_base_chat(
    State(state): State<AppState>,
    payload: Result<Json<KnowledgeChatRequest>, JsonRejection>,
) -> ApiResult<Json<KnowledgeChatResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    info!(
        knowledge_base = %request.knowledge_base_name,
        history = request.history.len(),
        "knowledge_base_chat request"
    );

    let answer = state
        .chat
        .knowledge_base_chat(&request)
        .await
        .map_err(ApiError::ChatFailed)?;

    Ok(Json(KnowledgeChatResponse::new(answer.answer, answer.docs)))
}

/// Handler for POST /chat/llm_chat
pub async fn llm_chat(
    State(state): State<AppState>,
    payload: Result<Json<LlmChatRequest>, JsonRejection>,
) -> ApiResult<Json<LlmChatResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    info!(history = request.history.len(), "llm_chat request");

    let answer = state
        .chat
        .llm_chat(&request)
        .await
        .map_err(ApiError::ChatFailed)?;

    Ok(Json(LlmChatResponse {
        answer: answer.answer,
    }))
}

/// Handler for GET /chat/check_str_like
pub async fn check_str_like(
    State(state): State<AppState>,
    query: Result<Query<CheckStrLikeQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let threshold = query
        .score_threshold
        .unwrap_or(state.default_score_threshold);

    let result = state
        .chat
        .search()
        .check_str_like(&query.query, threshold)
        .await?;
    Ok(Json(result))
}

/// Handler for POST /chat/set_qa_into_db
pub async fn set_qa_into_db(
    State(state): State<AppState>,
    payload: Result<Json<SetQaRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let result = state
        .chat
        .search()
        .set_qa_into_db(&request.query, &request.answer)
        .await?;
    Ok(Json(result))
}

/// Handler for POST /prompts/reload
pub async fn reload_prompts(State(state): State<AppState>) -> ApiResult<Json<ReloadResponse>> {
    let version = state.chat.prompts().reload()?;
    Ok(Json(ReloadResponse { version }))
}

/// Handler for GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::new(
        state.chat.prompts().version(),
        state.chat.models().model_names(),
    ))
}
