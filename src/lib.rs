// Uniclass Search - semantic search over Uniclass classification codes

pub mod config;
pub mod models;
pub mod types;
pub mod embeddings;  // OpenAI embedding client with retry/backoff
pub mod vector;      // Pinecone similarity query client
pub mod search;      // Embed-then-query pipeline
pub mod render;
pub mod routes;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
pub use search::SearchPipeline;
pub use types::{AppError, AppResult, Embedding, Match};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
