use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::external::news_provider::NewsError;
use crate::external::yahoofinance::BROWSER_USER_AGENT;
use crate::models::{NewsItem, Ticker};
use crate::services::markup::{self, Element};

/// Press-release pages never contribute more than this many entries
pub const MAX_SCRAPED_ITEMS: usize = 3;

/// A company newsroom adapter: fetches and parses its own page
#[async_trait]
pub trait PressReleaseScraper: Send + Sync {
    fn source_name(&self) -> &str;

    async fn fetch_items(&self, max_items: usize) -> Result<Vec<NewsItem>, NewsError>;
}

/// How entries are located on a newsroom page
#[derive(Debug, Clone, Copy)]
pub enum EntryRule {
    /// `<a class="...">` elements whose own text is the headline
    ClassedLink { class: &'static str },
    /// Elements with the class; headline from `title_tag` (or the element
    /// itself), link from the first `<a>` inside
    Container {
        class: &'static str,
        title_tag: Option<&'static str>,
    },
}

/// Generic selector-driven newsroom scraper
pub struct MarkupScraper {
    source: String,
    page_url: String,
    snippet: String,
    rule: EntryRule,
    client: Client,
}

impl MarkupScraper {
    pub fn new(
        source: impl Into<String>,
        page_url: impl Into<String>,
        snippet: impl Into<String>,
        rule: EntryRule,
        timeout: Duration,
    ) -> Self {
        Self {
            source: source.into(),
            page_url: page_url.into(),
            snippet: snippet.into(),
            rule,
            client: Client::builder()
                .user_agent(BROWSER_USER_AGENT)
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn apple(timeout: Duration) -> Self {
        Self::new(
            "Apple Newsroom",
            "https://www.apple.com/newsroom/",
            "Official Apple press release",
            EntryRule::ClassedLink { class: "article-link" },
            timeout,
        )
    }

    pub fn microsoft(timeout: Duration) -> Self {
        Self::new(
            "Microsoft News",
            "https://news.microsoft.com/",
            "Official Microsoft news",
            EntryRule::Container { class: "article-title", title_tag: None },
            timeout,
        )
    }

    pub fn amazon(timeout: Duration) -> Self {
        Self::new(
            "Amazon News",
            "https://www.aboutamazon.com/news",
            "Official Amazon news",
            EntryRule::Container { class: "post-item", title_tag: Some("h2") },
            timeout,
        )
    }

    /// Parse entries out of a fetched page
    pub fn parse(&self, html: &str, max_items: usize) -> Vec<NewsItem> {
        let base = Url::parse(&self.page_url).ok();

        let entries: Vec<(String, Option<String>, Option<String>)> = match self.rule {
            EntryRule::ClassedLink { class } => markup::elements(html, Some("a"), Some(class))
                .into_iter()
                .map(|a| (a.text(), a.attr("href"), a.datetime()))
                .collect(),
            EntryRule::Container { class, title_tag } => markup::elements(html, None, Some(class))
                .into_iter()
                .filter_map(|el| {
                    let title = match title_tag {
                        Some(tag) => el.first(tag)?.text(),
                        None => el.text(),
                    };
                    let href = link_of(&el)?;
                    Some((title, Some(href), el.datetime()))
                })
                .collect(),
        };

        entries
            .into_iter()
            .filter_map(|(title, href, datetime)| {
                if title.is_empty() {
                    return None;
                }
                let url = resolve(base.as_ref(), &href?)?;
                Some(NewsItem {
                    source: self.source.clone(),
                    headline: title,
                    url,
                    published_at: datetime.as_deref().and_then(parse_datetime),
                    body_snippet: self.snippet.clone(),
                })
            })
            .take(max_items.min(MAX_SCRAPED_ITEMS))
            .collect()
    }
}

fn link_of(el: &Element) -> Option<String> {
    if el.tag == "a" {
        return el.attr("href");
    }
    el.first("a").and_then(|a| a.attr("href"))
}

fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    match base {
        Some(base) => base.join(href).ok().map(|u| u.to_string()),
        None => Url::parse(href).ok().map(|u| u.to_string()),
    }
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[async_trait]
impl PressReleaseScraper for MarkupScraper {
    fn source_name(&self) -> &str {
        &self.source
    }

    async fn fetch_items(&self, max_items: usize) -> Result<Vec<NewsItem>, NewsError> {
        info!("Scraping {} ({})", self.source, self.page_url);

        let response = self
            .client
            .get(&self.page_url)
            .send()
            .await
            .map_err(|e| NewsError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NewsError::BadResponse(format!("HTTP {}", response.status())));
        }

        let html = response
            .text()
            .await
            .map_err(|e| NewsError::Parse(e.to_string()))?;

        let items = self.parse(&html, max_items);
        if items.is_empty() {
            warn!("{} page yielded no entries; selectors may be stale", self.source);
        }
        Ok(items)
    }
}

/// Maps allow-listed tickers to their newsroom adapter
#[derive(Clone, Default)]
pub struct ScraperRegistry {
    adapters: HashMap<String, Arc<dyn PressReleaseScraper>>,
}

impl ScraperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apple, Microsoft and Amazon newsrooms
    pub fn with_defaults(timeout: Duration) -> Self {
        let mut registry = Self::new();
        registry.register("AAPL", Arc::new(MarkupScraper::apple(timeout)));
        registry.register("MSFT", Arc::new(MarkupScraper::microsoft(timeout)));
        registry.register("AMZN", Arc::new(MarkupScraper::amazon(timeout)));
        registry
    }

    pub fn register(&mut self, symbol: &str, adapter: Arc<dyn PressReleaseScraper>) {
        self.adapters.insert(symbol.to_uppercase(), adapter);
    }

    pub fn get(&self, ticker: &Ticker) -> Option<Arc<dyn PressReleaseScraper>> {
        self.adapters.get(ticker.as_str()).cloned()
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.adapters.keys().cloned().collect();
        symbols.sort();
        symbols
    }
}
