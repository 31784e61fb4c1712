use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewsItem, Ticker};

pub(crate) const DEFAULT_SNIPPET: &str = "Click to read full article";

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Trait for news API providers
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Source label used in logs
    fn name(&self) -> &str;

    async fn fetch_news(
        &self,
        ticker: &Ticker,
        max_results: usize,
    ) -> Result<Vec<NewsItem>, NewsError>;
}

/// Shared response handling for the JSON news APIs
pub(crate) async fn read_json<T: for<'de> serde::Deserialize<'de>>(
    source: &str,
    response: Result<reqwest::Response, reqwest::Error>,
) -> Result<T, NewsError> {
    let response = response.map_err(|e| {
        tracing::error!("{} request failed: {}", source, e);
        NewsError::Network(e.to_string())
    })?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!("{} API error {}: {}", source, status, error_text);
        return Err(NewsError::BadResponse(format!("HTTP {}", status)));
    }

    response.json::<T>().await.map_err(|e| {
        tracing::error!("Failed to parse {} response: {}", source, e);
        NewsError::Parse(e.to_string())
    })
}
