use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::config::NewsConfig;
use crate::external::news_provider::{read_json, NewsError, NewsProvider, DEFAULT_SNIPPET};
use crate::models::{NewsItem, Ticker};

/// Finnhub company-news API (secondary source, requires a key)
pub struct FinnhubProvider {
    api_key: String,
    base_url: String,
    lookback_days: i64,
    client: Client,
}

impl FinnhubProvider {
    pub fn new(api_key: String, config: &NewsConfig) -> Self {
        Self {
            api_key,
            base_url: config.finnhub_base_url.trim_end_matches('/').to_string(),
            lookback_days: config.lookback_days,
            client: Client::builder()
                .timeout(config.timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FinnhubNewsItem {
    #[serde(default)]
    headline: String,
    #[serde(default)]
    url: String,
    source: Option<String>,
    datetime: Option<i64>,
    summary: Option<String>,
}

fn to_news_items(items: Vec<FinnhubNewsItem>, max_results: usize) -> Vec<NewsItem> {
    items
        .into_iter()
        .filter(|item| !item.headline.trim().is_empty())
        .take(max_results)
        .map(|item| NewsItem {
            source: item
                .source
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Finnhub".to_string()),
            headline: item.headline.trim().to_string(),
            url: item.url,
            published_at: item
                .datetime
                .filter(|ts| *ts > 0)
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            body_snippet: item
                .summary
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SNIPPET.to_string()),
        })
        .collect()
}

#[async_trait]
impl NewsProvider for FinnhubProvider {
    fn name(&self) -> &str {
        "Finnhub"
    }

    async fn fetch_news(
        &self,
        ticker: &Ticker,
        max_results: usize,
    ) -> Result<Vec<NewsItem>, NewsError> {
        info!("Fetching news from Finnhub for {}", ticker);

        let today = Utc::now().date_naive();
        let from = today - Duration::days(self.lookback_days);

        let response = self
            .client
            .get(format!("{}/api/v1/company-news", self.base_url))
            .query(&[
                ("symbol", ticker.to_string()),
                ("from", from.format("%Y-%m-%d").to_string()),
                ("to", today.format("%Y-%m-%d").to_string()),
                ("token", self.api_key.clone()),
            ])
            .send()
            .await;

        let body: Vec<FinnhubNewsItem> = read_json(self.name(), response).await?;
        let items = to_news_items(body, max_results);

        info!("Fetched {} news articles from Finnhub", items.len());
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{mock, Matcher};
    use serde_json::json;

    #[tokio::test]
    async fn test_fetches_and_maps_company_news() {
        let _m = mock("GET", "/api/v1/company-news")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("symbol".into(), "NVDA".into()),
                Matcher::UrlEncoded("token".into(), "fh-test".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    { "headline": "Nvidia beats estimates", "url": "https://example.com/nvda-1", "source": "CNBC", "datetime": 1704300000, "summary": "Strong quarter" },
                    { "headline": "", "url": "https://example.com/blank" },
                    { "headline": "Chip demand", "url": "https://example.com/nvda-2", "datetime": 0 }
                ])
                .to_string(),
            )
            .create();

        let config = NewsConfig {
            finnhub_base_url: mockito::server_url(),
            ..NewsConfig::default()
        };
        let provider = FinnhubProvider::new("fh-test".to_string(), &config);
        let ticker = Ticker::parse("NVDA").unwrap();

        let items = provider.fetch_news(&ticker, 5).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source, "CNBC");
        assert_eq!(items[0].body_snippet, "Strong quarter");
        assert_eq!(items[1].source, "Finnhub");
        assert!(items[1].published_at.is_none());
    }
}
