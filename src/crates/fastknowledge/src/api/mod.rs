//! REST API layer.
//!
//! - `POST /chat/knowledge_base_chat` - retrieval-grounded chat with citations
//! - `POST /chat/llm_chat` - plain chat
//! - `GET /chat/check_str_like`, `POST /chat/set_qa_into_db` - search service passthrough
//! - `POST /prompts/reload` - re-read prompt templates
//! - `GET /health`
//!
//! Every failure answers `{code, msg}`.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

pub use error::{ApiError, ApiResult, ErrorBody};
pub use routes::{create_router, AppState};
