use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MarketSnapshot, NewsItem, Report, Ticker, Trend};

/// Outcome of one dashboard run. Market data is mandatory; news and the
/// report carry their own inline error so the page can still render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub ticker: Ticker,
    pub company_name: String,
    pub market: MarketSnapshot,
    pub trend: Trend,
    pub news: Vec<NewsItem>,
    pub news_notice: Option<String>,
    pub report: Option<Report>,
    pub report_error: Option<String>,
    pub generated_at: DateTime<Utc>,
}
