// Vector similarity search

pub mod pinecone;

pub use pinecone::PineconeIndex;

use crate::types::{AppResult, Embedding, Match};
use async_trait::async_trait;

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Up to `top_k` matches in the provider's similarity order.
    /// An empty result is not an error.
    async fn query(&self, vector: &Embedding, top_k: u32, namespace: &str) -> AppResult<Vec<Match>>;
}
