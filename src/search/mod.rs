//! Search Module
//!
//! Free-text query → OpenAI embedding → Pinecone similarity query → ranked Uniclass codes.

pub mod pipeline;

pub use pipeline::SearchPipeline;
