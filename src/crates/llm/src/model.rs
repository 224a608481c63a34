//! The capability every chat backend implements.

use crate::error::Result;
use crate::message::{ChatMessage, ChatResult, GenerationParams};
use async_trait::async_trait;

/// A backend that turns an ordered message list into one completion.
///
/// Implementations must be cheap to share: the registry hands out
/// `Arc<dyn ChatModel>` and concurrent requests call `generate` on the same
/// instance. No implementation retries on its own.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a completion for `messages`.
    async fn generate(&self, messages: &[ChatMessage], params: &GenerationParams) -> Result<ChatResult>;

    /// Tag reported in [`ChatResult::model_tag`] by this backend.
    fn model_tag(&self) -> &str;
}
