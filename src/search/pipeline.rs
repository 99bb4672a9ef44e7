//! Two-stage search: embed the query text, then query the vector index with it.

use crate::config::{Config, SearchConfig};
use crate::embeddings::{Embedder, OpenAIEmbedder};
use crate::types::{AppError, AppResult, Match};
use crate::utils::build_http_client;
use crate::vector::{PineconeIndex, VectorIndex};
use std::sync::Arc;
use tracing::info;

/// Stateless between calls; safe to share across concurrent requests.
pub struct SearchPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    settings: SearchConfig,
}

impl SearchPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        settings: SearchConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            settings,
        }
    }

    /// Wire the OpenAI embedder and Pinecone index over one shared HTTP client
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let client = build_http_client(&config.http)?;
        let embedder = OpenAIEmbedder::new(client.clone(), &config.embedding);
        let index = PineconeIndex::new(client, &config.vector_db);

        Ok(Self::new(
            Arc::new(embedder),
            Arc::new(index),
            config.search.clone(),
        ))
    }

    pub fn settings(&self) -> &SearchConfig {
        &self.settings
    }

    /// Override the result count for this pipeline
    pub fn with_top_k(mut self, top_k: u32) -> AppResult<Self> {
        if top_k == 0 {
            return Err(AppError::InvalidRequest("top_k must be greater than 0".to_string()));
        }
        self.settings.top_k = top_k;
        Ok(self)
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.settings.namespace = namespace.into();
        self
    }

    /// Errors from either stage are returned unchanged.
    pub async fn search(&self, text: &str) -> AppResult<Vec<Match>> {
        info!(query = %text, namespace = %self.settings.namespace, "Running search");

        let embedding = self.embedder.embed(text, &self.settings.retry).await?;
        let matches = self
            .index
            .query(&embedding, self.settings.top_k, &self.settings.namespace)
            .await?;

        info!(count = matches.len(), "Search completed");
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmbeddingConfig, VectorDbConfig};
    use crate::types::Embedding;
    use crate::utils::RetryPolicy;
    use crate::utils::retry::testing::RecordingSleeper;
    use async_trait::async_trait;
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::Mutex;

    struct FixedEmbedder {
        values: Vec<f32>,
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str, _policy: &RetryPolicy) -> AppResult<Embedding> {
            Ok(Embedding::new("fixed", self.values.clone()))
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str, policy: &RetryPolicy) -> AppResult<Embedding> {
            Err(AppError::EmbeddingUnavailable {
                attempts: policy.max_attempts,
                last_error: "status 503".to_string(),
            })
        }
    }

    /// Records what the pipeline asked for
    #[derive(Default)]
    struct RecordingIndex {
        calls: Mutex<Vec<(Vec<f32>, u32, String)>>,
    }

    #[async_trait]
    impl VectorIndex for RecordingIndex {
        async fn query(&self, vector: &Embedding, top_k: u32, namespace: &str) -> AppResult<Vec<Match>> {
            self.calls
                .lock()
                .unwrap()
                .push((vector.values.clone(), top_k, namespace.to_string()));
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_defaults_reach_the_index() {
        let index = Arc::new(RecordingIndex::default());
        let pipeline = SearchPipeline::new(
            Arc::new(FixedEmbedder { values: vec![1.0, 2.0] }),
            index.clone(),
            SearchConfig::default(),
        );

        let matches = pipeline.search("wall").await.unwrap();

        assert!(matches.is_empty());
        let calls = index.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (vec![1.0, 2.0], 10, "uniclass_codes".to_string()));
    }

    #[tokio::test]
    async fn test_overrides_reach_the_index() {
        let index = Arc::new(RecordingIndex::default());
        let pipeline = SearchPipeline::new(
            Arc::new(FixedEmbedder { values: vec![0.5] }),
            index.clone(),
            SearchConfig::default(),
        )
        .with_top_k(3)
        .unwrap()
        .with_namespace("uniclass_2015");

        pipeline.search("floor").await.unwrap();

        let calls = index.calls.lock().unwrap();
        assert_eq!(calls[0].1, 3);
        assert_eq!(calls[0].2, "uniclass_2015");
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let pipeline = SearchPipeline::new(
            Arc::new(FailingEmbedder),
            Arc::new(RecordingIndex::default()),
            SearchConfig::default(),
        );
        assert!(matches!(pipeline.with_top_k(0), Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_embedding_failure_skips_query() {
        let index = Arc::new(RecordingIndex::default());
        let pipeline = SearchPipeline::new(
            Arc::new(FailingEmbedder),
            index.clone(),
            SearchConfig::default(),
        );

        let err = pipeline.search("wall").await.unwrap_err();

        assert!(matches!(err, AppError::EmbeddingUnavailable { attempts: 3, .. }));
        assert!(index.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_end_to_end_against_stubbed_providers() {
        let mut openai = mockito::Server::new_async().await;
        let embed_mock = openai
            .mock("POST", "/v1/embeddings")
            .match_body(Matcher::PartialJson(json!({"input": "wall"})))
            .with_status(200)
            .with_body(json!({"data": [{"embedding": [0.5, 0.25, 0.125]}]}).to_string())
            .expect(1)
            .create_async()
            .await;

        let mut pinecone = mockito::Server::new_async().await;
        let query_mock = pinecone
            .mock("POST", "/query")
            .match_body(Matcher::PartialJson(json!({
                "vector": [0.5, 0.25, 0.125],
                "topK": 10,
                "namespace": "uniclass_codes"
            })))
            .with_status(200)
            .with_body(
                json!({
                    "matches": [
                        {"id": "1", "score": 0.91, "metadata": {"code": "Ss_25_10", "title": "Walls"}},
                        {"id": "2", "score": 0.84, "metadata": {"code": "Ss_25_30", "title": "Floors"}}
                    ]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let embedder = OpenAIEmbedder::new(
            client.clone(),
            &EmbeddingConfig {
                api_key: "sk-test".to_string(),
                api_url: format!("{}/v1/embeddings", openai.url()),
                model: "text-embedding-ada-002".to_string(),
            },
        )
        .with_sleeper(Arc::new(RecordingSleeper::default()));
        let index = PineconeIndex::new(
            client,
            &VectorDbConfig {
                api_key: "pc-test".to_string(),
                index_url: pinecone.url(),
                dimension: Some(3),
            },
        );
        let pipeline = SearchPipeline::new(Arc::new(embedder), Arc::new(index), SearchConfig::default());

        let matches = pipeline.search("wall").await.unwrap();

        let rows: Vec<(usize, &str, &str)> = matches
            .iter()
            .map(|m| (m.rank, m.code.as_str(), m.title.as_str()))
            .collect();
        assert_eq!(rows, vec![(1, "Ss_25_10", "Walls"), (2, "Ss_25_30", "Floors")]);

        embed_mock.assert_async().await;
        query_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_vector_error_propagates_unchanged() {
        let mut pinecone = mockito::Server::new_async().await;
        let _mock = pinecone
            .mock("POST", "/query")
            .with_status(404)
            .with_body(r#"{"message":"Namespace not found"}"#)
            .create_async()
            .await;

        let index = PineconeIndex::new(
            reqwest::Client::new(),
            &VectorDbConfig {
                api_key: "pc-test".to_string(),
                index_url: pinecone.url(),
                dimension: None,
            },
        );
        let pipeline = SearchPipeline::new(
            Arc::new(FixedEmbedder { values: vec![0.1] }),
            Arc::new(index),
            SearchConfig::default(),
        );

        let err = pipeline.search("wall").await.unwrap_err();
        match err {
            AppError::VectorQuery(raw) => assert_eq!(raw, r#"{"message":"Namespace not found"}"#),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
