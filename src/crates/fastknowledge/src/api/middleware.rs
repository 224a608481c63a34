//! Tower layers wrapped around the router.

use crate::api::error::ApiError;
use axum::BoxError;
use tower::timeout::error::Elapsed;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Request spans at INFO with method, path and status.
pub fn logging_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .include_headers(false),
        )
}

/// Permissive CORS for the browser chat UI.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}

/// Turn errors from the tower stack (the whole-request deadline) into the
/// `{code, msg}` body.
pub async fn handle_layer_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::Internal(err.to_string())
    }
}
