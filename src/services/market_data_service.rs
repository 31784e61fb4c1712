use std::sync::Arc;
use tracing::{info, warn};

use crate::config::MarketConfig;
use crate::errors::AppError;
use crate::external::market_provider::MarketDataProvider;
use crate::models::{MarketSnapshot, MovingAverages, PriceSeries, StatementKind, Ticker};
use crate::services::indicators::{sma, trailing_mean};

pub const SHORT_WINDOW: usize = 50;
pub const LONG_WINDOW: usize = 200;

/// Collects prices, statements and the company profile for one ticker
pub struct MarketDataService {
    provider: Arc<dyn MarketDataProvider>,
    history_range: String,
}

impl MarketDataService {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: &MarketConfig) -> Self {
        Self {
            provider,
            history_range: config.history_range.clone(),
        }
    }

    /// Price history is mandatory; the profile is best-effort.
    pub async fn fetch(&self, ticker: &Ticker) -> Result<MarketSnapshot, AppError> {
        info!("Fetching market data for {} (range {})", ticker, self.history_range);

        let history = self
            .provider
            .fetch_daily_history(ticker, &self.history_range)
            .await
            .map_err(|e| {
                warn!("Price history fetch failed for {}: {}", ticker, e);
                AppError::from(e)
            })?;

        if history.bars.is_empty() {
            return Err(AppError::DataUnavailable(format!(
                "no price history returned for {}",
                ticker
            )));
        }

        let income = self.provider.fetch_statement(ticker, StatementKind::Income).await?;
        let balance_sheet = self
            .provider
            .fetch_statement(ticker, StatementKind::BalanceSheet)
            .await?;

        let mut profile = match self.provider.fetch_profile(ticker).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!("Company profile unavailable for {}: {}", ticker, e);
                None
            }
        };
        if let Some(p) = profile.as_mut() {
            if p.name.is_none() {
                p.name = history.long_name.clone();
            }
        }

        let prices = PriceSeries::new(history.bars);
        let moving_averages = moving_averages(&prices);

        info!(
            "Market data for {}: {} bars, {} income periods, {} balance sheet periods, trend {}",
            ticker,
            prices.len(),
            income.periods.len(),
            balance_sheet.periods.len(),
            moving_averages.trend()
        );

        Ok(MarketSnapshot {
            ticker: ticker.clone(),
            currency: history.currency,
            profile,
            prices,
            income,
            balance_sheet,
            moving_averages,
        })
    }
}

/// 50- and 200-day trailing means over the closes, plus the overlay series
pub fn moving_averages(prices: &PriceSeries) -> MovingAverages {
    let closes = prices.closes();
    MovingAverages {
        ma50: trailing_mean(&closes, SHORT_WINDOW),
        ma200: trailing_mean(&closes, LONG_WINDOW),
        ma50_series: sma(&closes, SHORT_WINDOW),
        ma200_series: sma(&closes, LONG_WINDOW),
    }
}
