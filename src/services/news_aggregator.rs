use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

use crate::config::NewsConfig;
use crate::errors::AppError;
use crate::external::finnhub::FinnhubProvider;
use crate::external::news_provider::NewsProvider;
use crate::external::yahoo_news::YahooNewsProvider;
use crate::models::{NewsItem, Ticker};
use crate::services::press_releases::ScraperRegistry;

/// Merges the primary API, the optional keyed secondary API and the
/// press-release scraper for allow-listed tickers.
pub struct NewsAggregator {
    primary: Arc<dyn NewsProvider>,
    secondary: Option<Arc<dyn NewsProvider>>,
    scrapers: ScraperRegistry,
    scraping_enabled: bool,
    max_items_per_source: usize,
    max_total_items: usize,
}

impl NewsAggregator {
    pub fn new(
        primary: Arc<dyn NewsProvider>,
        secondary: Option<Arc<dyn NewsProvider>>,
        scrapers: ScraperRegistry,
        config: &NewsConfig,
    ) -> Self {
        Self {
            primary,
            secondary,
            scrapers,
            scraping_enabled: config.scraping_enabled,
            max_items_per_source: config.max_items_per_source,
            max_total_items: config.max_total_items,
        }
    }

    /// Wire the production sources from configuration
    pub fn from_config(config: &NewsConfig) -> Self {
        let primary: Arc<dyn NewsProvider> = Arc::new(YahooNewsProvider::new(config));

        let secondary: Option<Arc<dyn NewsProvider>> = match &config.finnhub_api_key {
            Some(api_key) => {
                info!("Finnhub news source enabled");
                Some(Arc::new(FinnhubProvider::new(api_key.clone(), config)))
            }
            None => {
                info!("FINNHUB_API_KEY not set; Finnhub news source disabled");
                None
            }
        };

        let scrapers = ScraperRegistry::with_defaults(config.timeout);
        Self::new(primary, secondary, scrapers, config)
    }

    /// Fetch every applicable source in order and merge the results.
    ///
    /// A failing source contributes nothing. The call only fails when the
    /// merged result is empty.
    pub async fn aggregate(&self, ticker: &Ticker) -> Result<Vec<NewsItem>, AppError> {
        let mut batches: Vec<Vec<NewsItem>> = Vec::with_capacity(3);
        let mut attempted = 0usize;
        let mut failed = 0usize;

        attempted += 1;
        match self.primary.fetch_news(ticker, self.max_items_per_source).await {
            Ok(items) => batches.push(items),
            Err(e) => {
                warn!("{} news failed for {}: {}", self.primary.name(), ticker, e);
                failed += 1;
            }
        }

        if let Some(secondary) = &self.secondary {
            attempted += 1;
            match secondary.fetch_news(ticker, self.max_items_per_source).await {
                Ok(items) => batches.push(items),
                Err(e) => {
                    warn!("{} news failed for {}: {}", secondary.name(), ticker, e);
                    failed += 1;
                }
            }
        }

        if self.scraping_enabled {
            if let Some(scraper) = self.scrapers.get(ticker) {
                attempted += 1;
                match scraper.fetch_items(self.max_items_per_source).await {
                    Ok(items) => batches.push(items),
                    Err(e) => {
                        warn!("{} scrape failed for {}: {}", scraper.source_name(), ticker, e);
                        failed += 1;
                    }
                }
            }
        }

        let mut merged = merge_sources(batches);
        merged.truncate(self.max_total_items);

        if merged.is_empty() {
            let reason = if failed == attempted {
                format!("all {} news sources failed for {}", attempted, ticker)
            } else {
                format!("no recent articles found for {}", ticker)
            };
            warn!("{}", reason);
            return Err(AppError::NoNewsAvailable(reason));
        }

        info!(
            "Aggregated {} news items for {} ({} of {} sources succeeded)",
            merged.len(),
            ticker,
            attempted - failed,
            attempted
        );
        Ok(merged)
    }
}

/// Deduplicate batches in priority order, then order newest first.
///
/// Earlier batches win on duplicate keys. Undated items sort last and keep
/// their relative order.
pub fn merge_sources(batches: Vec<Vec<NewsItem>>) -> Vec<NewsItem> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged: Vec<NewsItem> = batches
        .into_iter()
        .flatten()
        .filter(|item| !item.headline.trim().is_empty())
        .filter(has_web_link)
        .filter(|item| seen.insert(dedup_key(item)))
        .collect();

    merged.sort_by(|a, b| match (a.published_at, b.published_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    merged
}

/// Links end up in an `href`, so only http(s) URLs (or none at all) are kept
fn has_web_link(item: &NewsItem) -> bool {
    let url = item.url.trim();
    if url.is_empty() || url == "#" {
        return true;
    }
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn dedup_key(item: &NewsItem) -> String {
    let url = item.url.trim();
    if url.is_empty() || url == "#" {
        format!("headline:{}", item.headline.trim().to_lowercase())
    } else {
        normalize_url(url)
    }
}

/// Canonical form of an article URL used as the dedup key.
///
/// Lower-cases scheme and host, drops the fragment and `utm_*` tracking
/// parameters, and trims a trailing slash from the path.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut url) = Url::parse(trimmed) else {
        return trimmed.trim_end_matches('/').to_lowercase();
    };

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !k.to_lowercase().starts_with("utm_"))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&path);

    // Url already lower-cases scheme and host
    url.to_string().trim_end_matches('/').to_string()
}
