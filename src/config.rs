use anyhow::{anyhow, Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::utils::RetryPolicy;

pub const DEFAULT_EMBEDDING_API_URL: &str = "https://api.openai.com/v1/embeddings";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_NAMESPACE: &str = "uniclass_codes";
pub const DEFAULT_TOP_K: u32 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub embedding: EmbeddingConfig,
    pub vector_db: VectorDbConfig,
    pub search: SearchConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Clone)]
pub struct EmbeddingConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
}

#[derive(Clone)]
pub struct VectorDbConfig {
    pub api_key: String,
    /// Index host (`my-index.svc.pinecone.io`) or full base URL
    pub index_url: String,
    /// Expected embedding length; unchecked when unset
    pub dimension: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub namespace: String,
    pub top_k: u32,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

// Keys stay out of logs
impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish()
    }
}

impl std::fmt::Debug for VectorDbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorDbConfig")
            .field("api_key", &"<redacted>")
            .field("index_url", &self.index_url)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            top_k: DEFAULT_TOP_K,
            retry: RetryPolicy::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{} must be set", key))
        };
        let or_default = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let top_k: u32 = parse_or(&lookup, "SEARCH_TOP_K", DEFAULT_TOP_K)?;
        if top_k == 0 {
            return Err(anyhow!("SEARCH_TOP_K must be greater than 0"));
        }

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy::new(
            parse_or(&lookup, "RETRY_MAX_ATTEMPTS", defaults.max_attempts)?,
            parse_or(&lookup, "RETRY_BACKOFF_BASE", defaults.backoff_base)?,
            parse_or(&lookup, "RETRY_JITTER_MAX", defaults.jitter_max)?,
        )?;

        let dimension = match lookup("VECTOR_DIMENSION").filter(|v| !v.trim().is_empty()) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<usize>()
                    .with_context(|| format!("VECTOR_DIMENSION is not a valid number: {}", raw))?,
            ),
            None => None,
        };

        Ok(Self {
            server: ServerConfig {
                port: parse_or(&lookup, "PORT", 3000)?,
                host: or_default("HOST", "0.0.0.0"),
            },
            embedding: EmbeddingConfig {
                api_key: required("OPENAI_API_KEY")?,
                api_url: or_default("EMBEDDING_API_URL", DEFAULT_EMBEDDING_API_URL),
                model: or_default("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            },
            vector_db: VectorDbConfig {
                api_key: required("PINECONE_API_KEY")?,
                index_url: required("PINECONE_INDEX_URL")?,
                dimension,
            },
            search: SearchConfig {
                namespace: or_default("PINECONE_NAMESPACE", DEFAULT_NAMESPACE),
                top_k,
                retry,
            },
            http: HttpConfig {
                connect_timeout: Duration::from_secs(parse_or(&lookup, "HTTP_CONNECT_TIMEOUT_SECS", 10)?),
                read_timeout: Duration::from_secs(parse_or(&lookup, "HTTP_READ_TIMEOUT_SECS", 30)?),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}
