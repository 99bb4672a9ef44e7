// OpenAI embeddings adapter
// API Reference: https://platform.openai.com/docs/api-reference/embeddings/create
//
// Status handling:
// - 200: success
// - 429 and every 5xx: transient, retried under the RetryPolicy
// - anything else: permanent, returned immediately with the raw body

use crate::config::EmbeddingConfig;
use crate::embeddings::Embedder;
use crate::types::{AppError, AppResult, Embedding};
use crate::utils::{with_retry, Attempt, RetryError, RetryPolicy, Sleeper, TokioSleeper};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

pub struct OpenAIEmbedder {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    sleeper: Arc<dyn Sleeper>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// 429 or any server-side status
fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500
}

impl OpenAIEmbedder {
    pub fn new(client: Client, config: &EmbeddingConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the backoff sleeper (tests record delays instead of waiting)
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    async fn attempt(&self, text: &str) -> Attempt<Vec<f32>, String> {
        let request = EmbeddingRequest {
            input: text,
            model: &self.model,
        };

        let response = match self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Attempt::Abort(format!("request failed: {}", e)),
        };

        let status = response.status();
        if status == StatusCode::OK {
            return match response.json::<EmbeddingResponse>().await {
                Ok(body) => match body.data.into_iter().next() {
                    Some(data) => Attempt::Done(data.embedding),
                    None => Attempt::Abort("response contained no embeddings".to_string()),
                },
                Err(e) => Attempt::Abort(format!("failed to parse response: {}", e)),
            };
        }

        let error_text = response.text().await.unwrap_or_default();
        if is_transient(status) {
            Attempt::Retry(format!("status {}: {}", status, error_text))
        } else {
            Attempt::Abort(error_text)
        }
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str, policy: &RetryPolicy) -> AppResult<Embedding> {
        debug!(model = %self.model, max_attempts = policy.max_attempts, "Requesting embedding");

        match with_retry(policy, self.sleeper.as_ref(), |_| self.attempt(text)).await {
            Ok(values) => {
                info!(dimension = values.len(), "Embedding received");
                Ok(Embedding::new(&self.model, values))
            }
            Err(RetryError::Aborted(payload)) => Err(AppError::EmbeddingRequest(payload)),
            Err(RetryError::Exhausted { attempts, last }) => Err(AppError::EmbeddingUnavailable {
                attempts,
                last_error: last,
            }),
        }
    }
}
