//! Fake providers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, TimeZone, Utc};

use finbuddy::config::{AppConfig, NewsConfig, ReportConfig};
use finbuddy::errors::LlmError;
use finbuddy::external::market_provider::{MarketDataError, MarketDataProvider, PriceHistory};
use finbuddy::external::news_provider::{NewsError, NewsProvider};
use finbuddy::models::{CompanyProfile, FinancialStatement, NewsItem, PriceBar, StatementKind, Ticker};
use finbuddy::services::company_directory::CompanyDirectory;
use finbuddy::services::dashboard_service::DashboardService;
use finbuddy::services::llm_service::{LlmProvider, LlmService};
use finbuddy::services::market_data_service::MarketDataService;
use finbuddy::services::news_aggregator::NewsAggregator;
use finbuddy::services::press_releases::ScraperRegistry;
use finbuddy::services::report_composer::ReportComposer;
use finbuddy::state::AppState;

pub const UNKNOWN_TICKER: &str = "ZZZZ";

pub const FULL_REPORT: &str = "\
## Business Overview
Designs phones and services.
## Financial Health
Large cash pile.
## Technical Analysis
Above both moving averages.
## News Summary
Product launch coverage.
## Recommendation
Hold.";

/// 252 daily bars with closes 1.0, 2.0, ... 252.0; no data for ZZZZ
pub struct FakeMarket;

#[async_trait]
impl MarketDataProvider for FakeMarket {
    async fn fetch_daily_history(&self, ticker: &Ticker, _range: &str) -> Result<PriceHistory, MarketDataError> {
        if ticker.as_str() == UNKNOWN_TICKER {
            return Ok(PriceHistory::default());
        }
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let bars = (1..=252)
            .map(|i| {
                let close = i as f64;
                PriceBar {
                    date: start + Duration::days(i),
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000_000,
                }
            })
            .collect();
        Ok(PriceHistory {
            bars,
            currency: Some("USD".to_string()),
            long_name: Some(format!("{} Holdings", ticker)),
        })
    }

    async fn fetch_statement(&self, _ticker: &Ticker, kind: StatementKind) -> Result<FinancialStatement, MarketDataError> {
        let mut statement = FinancialStatement::empty(kind);
        if kind == StatementKind::Income {
            statement.insert(NaiveDate::from_ymd_opt(2023, 9, 30).unwrap(), "TotalRevenue", 383.285e9);
        }
        Ok(statement)
    }

    async fn fetch_profile(&self, _ticker: &Ticker) -> Result<CompanyProfile, MarketDataError> {
        Ok(CompanyProfile {
            sector: Some("Technology".to_string()),
            market_cap: Some(2.9e12),
            ..Default::default()
        })
    }
}

pub enum NewsBehavior {
    Items(usize),
    Fail,
}

pub struct FakeNews {
    pub name: &'static str,
    pub behavior: NewsBehavior,
}

#[async_trait]
impl NewsProvider for FakeNews {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch_news(&self, ticker: &Ticker, max_results: usize) -> Result<Vec<NewsItem>, NewsError> {
        match self.behavior {
            NewsBehavior::Fail => Err(NewsError::Network("connection refused".to_string())),
            NewsBehavior::Items(n) => Ok((0..n.min(max_results))
                .map(|i| NewsItem {
                    source: self.name.to_string(),
                    headline: format!("{} story {} about {}", self.name, i, ticker),
                    url: format!("https://{}.example.com/{}/{}", self.name.to_lowercase(), ticker, i),
                    published_at: Some(Utc.with_ymd_and_hms(2024, 5, 1 + i as u32, 12, 0, 0).unwrap()),
                    body_snippet: String::new(),
                })
                .collect()),
        }
    }
}

pub struct FakeLlm {
    pub reply: Option<&'static str>,
}

#[async_trait]
impl LlmProvider for FakeLlm {
    async fn generate_completion(&self, _system: &str, _prompt: String) -> Result<String, LlmError> {
        self.reply
            .map(str::to_string)
            .ok_or_else(|| LlmError::ApiError("HTTP 500: upstream exploded".to_string()))
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}

pub struct Setup {
    pub primary: NewsBehavior,
    pub secondary: Option<NewsBehavior>,
    pub llm_reply: Option<&'static str>,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            primary: NewsBehavior::Items(3),
            secondary: None,
            llm_reply: Some(FULL_REPORT),
        }
    }
}

pub fn dashboard(setup: Setup) -> DashboardService {
    let config = AppConfig::default();
    let market = MarketDataService::new(Arc::new(FakeMarket), &config.market);

    let primary: Arc<dyn NewsProvider> = Arc::new(FakeNews { name: "Primary", behavior: setup.primary });
    let secondary = setup
        .secondary
        .map(|behavior| Arc::new(FakeNews { name: "Secondary", behavior }) as Arc<dyn NewsProvider>);
    let news = NewsAggregator::new(primary, secondary, ScraperRegistry::new(), &NewsConfig::default());

    let llm = LlmService::with_provider(Arc::new(FakeLlm { reply: setup.llm_reply }));
    let composer = ReportComposer::new(Arc::new(llm), ReportConfig::default());

    let directory = CompanyDirectory::from_json(r#"{"Technology": {"Apple Inc.": "AAPL"}}"#).unwrap();

    DashboardService::new(Arc::new(market), Arc::new(news), Arc::new(composer), Arc::new(directory))
}

pub fn state(setup: Setup) -> AppState {
    AppState {
        dashboard: Arc::new(dashboard(setup)),
        config: Arc::new(AppConfig::default()),
    }
}
