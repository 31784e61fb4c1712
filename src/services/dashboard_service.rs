use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{Analysis, MarketSnapshot, NewsItem, Report, Ticker};
use crate::services::company_directory::CompanyDirectory;
use crate::services::market_data_service::MarketDataService;
use crate::services::news_aggregator::NewsAggregator;
use crate::services::report_composer::{ReportComposer, ReportInput};

/// Runs the market data -> news -> report pipeline for one ticker
pub struct DashboardService {
    market: Arc<MarketDataService>,
    news: Arc<NewsAggregator>,
    composer: Arc<ReportComposer>,
    directory: Arc<CompanyDirectory>,
}

impl DashboardService {
    pub fn new(
        market: Arc<MarketDataService>,
        news: Arc<NewsAggregator>,
        composer: Arc<ReportComposer>,
        directory: Arc<CompanyDirectory>,
    ) -> Self {
        Self {
            market,
            news,
            composer,
            directory,
        }
    }

    pub fn directory(&self) -> &CompanyDirectory {
        &self.directory
    }

    /// Full dashboard run.
    ///
    /// Only validation and market data errors abort. Missing news and a
    /// failed report are recorded on the returned analysis.
    pub async fn analyze(&self, raw_ticker: &str) -> Result<Analysis, AppError> {
        let ticker = Ticker::parse(raw_ticker)?;
        info!("Starting analysis for {}", ticker);

        let market = self.market.fetch(&ticker).await?;
        let company_name = self.company_name(&ticker, &market);

        let (news, news_notice) = match self.news.aggregate(&ticker).await {
            Ok(items) => (items, None),
            Err(e) => {
                warn!("Continuing {} without news: {}", ticker, e);
                (Vec::new(), Some(e.to_string()))
            }
        };

        let input = ReportInput {
            company_name: &company_name,
            market: &market,
            news: &news,
        };
        let (report, report_error) = match self.composer.compose(&input).await {
            Ok(report) => (Some(report), None),
            Err(e) => (None, Some(e.to_string())),
        };

        info!(
            "Analysis for {} complete: {} bars, {} news items, report {}",
            ticker,
            market.prices.len(),
            news.len(),
            if report.is_some() { "ok" } else { "failed" }
        );

        Ok(Analysis {
            trend: market.moving_averages.trend(),
            ticker,
            company_name,
            market,
            news,
            news_notice,
            report,
            report_error,
            generated_at: Utc::now(),
        })
    }

    /// News for a ticker, without touching market data or the model
    pub async fn news(&self, raw_ticker: &str) -> Result<Vec<NewsItem>, AppError> {
        let ticker = Ticker::parse(raw_ticker)?;
        self.news.aggregate(&ticker).await
    }

    /// Report only; every step's error is returned as-is
    pub async fn report(&self, raw_ticker: &str) -> Result<Report, AppError> {
        let ticker = Ticker::parse(raw_ticker)?;
        let market = self.market.fetch(&ticker).await?;
        let company_name = self.company_name(&ticker, &market);
        let news = self.news.aggregate(&ticker).await?;

        self.composer
            .compose(&ReportInput {
                company_name: &company_name,
                market: &market,
                news: &news,
            })
            .await
    }

    fn company_name(&self, ticker: &Ticker, market: &MarketSnapshot) -> String {
        self.directory
            .name_for(ticker.as_str())
            .map(str::to_string)
            .or_else(|| market.profile.as_ref().and_then(|p| p.name.clone()))
            .unwrap_or_else(|| ticker.to_string())
    }
}
