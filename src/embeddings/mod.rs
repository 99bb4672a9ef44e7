// Embedding generation

pub mod openai;

pub use openai::OpenAIEmbedder;

use crate::types::{AppResult, Embedding};
use crate::utils::RetryPolicy;
use async_trait::async_trait;

/// Turns query text into a vector
#[async_trait]
pub trait Embedder: Send + Sync {
    /// The text is sent as-is; callers reject empty queries upstream.
    async fn embed(&self, text: &str, policy: &RetryPolicy) -> AppResult<Embedding>;
}
