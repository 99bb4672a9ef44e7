// Shared HTTP client construction

use crate::config::HttpConfig;
use crate::types::{AppError, AppResult};
use reqwest::Client;

/// Build the pooled client used by both providers.
/// `read_timeout` bounds each whole request, so a stalled provider surfaces as an error.
pub fn build_http_client(config: &HttpConfig) -> AppResult<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.read_timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_with_defaults() {
        assert!(build_http_client(&HttpConfig::default()).is_ok());
    }
}
