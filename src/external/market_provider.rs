use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CompanyProfile, FinancialStatement, PriceBar, StatementKind, Ticker};

/// Raw daily history as returned by a market-data provider
#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    pub bars: Vec<PriceBar>,
    pub currency: Option<String>,
    pub long_name: Option<String>,
}

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("no data found for {0}")]
    NotFound(String),

    #[error("rate limited")]
    RateLimited,
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily OHLCV bars for a Yahoo-style range token ("6mo", "1y", ...)
    async fn fetch_daily_history(
        &self,
        ticker: &Ticker,
        range: &str,
    ) -> Result<PriceHistory, MarketDataError>;

    /// Annual statement line items; an empty statement is a valid answer
    async fn fetch_statement(
        &self,
        ticker: &Ticker,
        kind: StatementKind,
    ) -> Result<FinancialStatement, MarketDataError>;

    async fn fetch_profile(&self, ticker: &Ticker) -> Result<CompanyProfile, MarketDataError>;
}
