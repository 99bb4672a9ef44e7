// Pinecone query adapter
// API Reference: https://docs.pinecone.io/reference/api/data-plane/query
//
// A single attempt per query: any non-success status is surfaced as-is.

use crate::config::VectorDbConfig;
use crate::types::{AppError, AppResult, Embedding, Match};
use crate::vector::VectorIndex;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub struct PineconeIndex {
    client: Client,
    query_url: String,
    api_key: String,
    dimension: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: u32,
    include_values: bool,
    include_metadata: bool,
    namespace: &'a str,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    metadata: Option<MatchMetadata>,
}

#[derive(Deserialize)]
struct MatchMetadata {
    code: Option<String>,
    title: Option<String>,
}

/// `{index_url}/query`, defaulting bare hosts to https
fn query_url(index_url: &str) -> String {
    let base = index_url.trim().trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{}/query", base)
    } else {
        format!("https://{}/query", base)
    }
}

impl PineconeIndex {
    pub fn new(client: Client, config: &VectorDbConfig) -> Self {
        Self {
            client,
            query_url: query_url(&config.index_url),
            api_key: config.api_key.clone(),
            dimension: config.dimension,
        }
    }

    fn into_matches(response: QueryResponse, top_k: u32) -> AppResult<Vec<Match>> {
        response
            .matches
            .into_iter()
            .take(top_k as usize)
            .enumerate()
            .map(|(position, m)| {
                let label = m.id.unwrap_or_else(|| format!("#{}", position + 1));
                let metadata = m.metadata.ok_or_else(|| {
                    AppError::VectorQuery(format!("match {} has no metadata", label))
                })?;
                match (metadata.code, metadata.title) {
                    (Some(code), Some(title)) => Ok(Match {
                        rank: position + 1,
                        code,
                        title,
                        score: m.score,
                    }),
                    _ => Err(AppError::VectorQuery(format!(
                        "match {} is missing code or title metadata",
                        label
                    ))),
                }
            })
            .collect()
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(&self, vector: &Embedding, top_k: u32, namespace: &str) -> AppResult<Vec<Match>> {
        if top_k == 0 {
            return Err(AppError::InvalidRequest("top_k must be greater than 0".to_string()));
        }
        if vector.is_empty() {
            return Err(AppError::VectorQuery("cannot query with an empty vector".to_string()));
        }
        if let Some(expected) = self.dimension {
            if vector.dimension() != expected {
                return Err(AppError::VectorQuery(format!(
                    "embedding from {} has dimension {}, index expects {}",
                    vector.model,
                    vector.dimension(),
                    expected
                )));
            }
        }

        debug!(top_k, namespace, dimension = vector.dimension(), "Querying Pinecone");

        let request = QueryRequest {
            vector: &vector.values,
            top_k,
            include_values: false,
            include_metadata: true,
            namespace,
        };

        let response = self
            .client
            .post(&self.query_url)
            .header("Api-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::VectorQuery(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::VectorQuery(error_text));
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| AppError::VectorQuery(format!("failed to parse response: {}", e)))?;

        let matches = Self::into_matches(body, top_k)?;
        info!(count = matches.len(), "Pinecone query completed");
        Ok(matches)
    }
}
