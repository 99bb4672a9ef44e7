// Type definitions shared by the search pipeline

use serde::{Deserialize, Serialize};

/// Embedding vector returned by the embedding provider
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    /// Model that produced the vector
    pub model: String,
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(model: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            model: model.into(),
            values,
        }
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A single ranked search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// 1-based position in the provider's ordering
    pub rank: usize,
    /// Uniclass code, e.g. "Ss_25_10"
    pub code: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("OpenAI API error: {0}")]
    EmbeddingRequest(String),

    #[error("OpenAI API request failed after {attempts} attempts")]
    EmbeddingUnavailable { attempts: u32, last_error: String },

    #[error("Pinecone API error: {0}")]
    VectorQuery(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;
