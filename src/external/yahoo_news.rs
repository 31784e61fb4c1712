use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::config::NewsConfig;
use crate::external::news_provider::{read_json, NewsError, NewsProvider, DEFAULT_SNIPPET};
use crate::external::yahoofinance::BROWSER_USER_AGENT;
use crate::models::{NewsItem, Ticker};

/// Yahoo Finance search news (primary source, no key)
pub struct YahooNewsProvider {
    client: Client,
    base_url: String,
}

impl YahooNewsProvider {
    pub fn new(config: &NewsConfig) -> Self {
        Self {
            client: Client::builder()
                .user_agent(BROWSER_USER_AGENT)
                .timeout(config.timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: config.yahoo_search_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct YahooSearchResponse {
    #[serde(default)]
    news: Vec<YahooNewsItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooNewsItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    publisher: Option<String>,
    provider_publish_time: Option<i64>,
    summary: Option<String>,
}

fn to_news_items(response: YahooSearchResponse, max_results: usize) -> Vec<NewsItem> {
    response
        .news
        .into_iter()
        .filter(|item| !item.title.trim().is_empty())
        .take(max_results)
        .map(|item| NewsItem {
            source: item.publisher.unwrap_or_else(|| "Yahoo Finance".to_string()),
            headline: item.title.trim().to_string(),
            url: item.link,
            published_at: item
                .provider_publish_time
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
impl NewsProvider for YahooNewsProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    async fn fetch_news(
        &self,
        ticker: &Ticker,
        max_results: usize,
    ) -> Result<Vec<NewsItem>, NewsError> {
        info!("Fetching news from Yahoo Finance for {}", ticker);

        let response = self
            .client
            .get(format!("{}/v1/finance/search", self.base_url))
            .query(&[
                ("q", ticker.to_string()),
                ("newsCount", max_results.to_string()),
                ("quotesCount", "0".to_string()),
            ])
            .send()
            .await;

        let body: YahooSearchResponse = read_json(self.name(), response).await?;
        let items = to_news_items(body, max_results);

        info!("Fetched {} news articles from Yahoo Finance", items.len());
        Ok(items)
    }
}
