use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Ticker;

/// One daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Daily bars in ascending date order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by(|a, b| a.date.cmp(&b.date));
        Self { bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Income,
    BalanceSheet,
}

impl StatementKind {
    /// Line items requested from the fundamentals endpoint
    pub fn line_items(&self) -> &'static [&'static str] {
        match self {
            StatementKind::Income => &[
                "TotalRevenue",
                "GrossProfit",
                "OperatingIncome",
                "NetIncome",
                "EBITDA",
                "DilutedEPS",
            ],
            StatementKind::BalanceSheet => &[
                "TotalAssets",
                "TotalLiabilitiesNetMinorityInterest",
                "StockholdersEquity",
                "CashAndCashEquivalents",
                "TotalDebt",
                "CurrentAssets",
                "CurrentLiabilities",
            ],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatementKind::Income => "Income Statement",
            StatementKind::BalanceSheet => "Balance Sheet",
        }
    }
}

/// Line items per reporting period (period end date -> item -> value)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialStatement {
    pub kind: StatementKind,
    pub periods: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
}

impl FinancialStatement {
    pub fn empty(kind: StatementKind) -> Self {
        Self {
            kind,
            periods: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn insert(&mut self, period: NaiveDate, item: impl Into<String>, value: f64) {
        self.periods
            .entry(period)
            .or_default()
            .insert(item.into(), value);
    }

    pub fn latest(&self) -> Option<(&NaiveDate, &BTreeMap<String, f64>)> {
        self.periods.iter().next_back()
    }

    pub fn latest_value(&self, item: &str) -> Option<f64> {
        self.latest().and_then(|(_, items)| items.get(item).copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Undetermined,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Bullish => write!(f, "Bullish"),
            Trend::Bearish => write!(f, "Bearish"),
            Trend::Undetermined => write!(f, "Undetermined"),
        }
    }
}

/// Trailing simple moving averages of the close
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovingAverages {
    pub ma50: Option<f64>,
    pub ma200: Option<f64>,
    /// Full SMA series aligned with the price bars, used for chart overlays
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ma50_series: Vec<Option<f64>>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ma200_series: Vec<Option<f64>>,
}

impl MovingAverages {
    pub fn trend(&self) -> Trend {
        match (self.ma50, self.ma200) {
            (Some(short), Some(long)) if short > long => Trend::Bullish,
            (Some(_), Some(_)) => Trend::Bearish,
            _ => Trend::Undetermined,
        }
    }
}

/// Descriptive company data and headline ratios; every field is best-effort
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
    pub employees: Option<u64>,
    pub trailing_pe: Option<f64>,
    pub profit_margin: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub summary: Option<String>,
}

/// Everything the market-data step produces for one ticker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: Ticker,
    pub currency: Option<String>,
    pub profile: Option<CompanyProfile>,
    pub prices: PriceSeries,
    pub income: FinancialStatement,
    pub balance_sheet: FinancialStatement,
    pub moving_averages: MovingAverages,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn test_price_series_sorts_bars() {
        let series = PriceSeries::new(vec![bar(3, 3.0), bar(1, 1.0), bar(2, 2.0)]);
        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
        assert_eq!(series.last_close(), Some(3.0));
    }

    #[test]
    fn test_statement_latest_value_uses_most_recent_period() {
        let mut statement = FinancialStatement::empty(StatementKind::Income);
        statement.insert(NaiveDate::from_ymd_opt(2022, 9, 30).unwrap(), "NetIncome", 1.0);
        statement.insert(NaiveDate::from_ymd_opt(2023, 9, 30).unwrap(), "NetIncome", 2.0);
        assert_eq!(statement.latest_value("NetIncome"), Some(2.0));
        assert_eq!(statement.latest_value("TotalRevenue"), None);
    }

    #[test]
    fn test_trend() {
        let mut ma = MovingAverages { ma50: Some(110.0), ma200: Some(100.0), ..Default::default() };
        assert_eq!(ma.trend(), Trend::Bullish);
        ma.ma50 = Some(90.0);
        assert_eq!(ma.trend(), Trend::Bearish);
        ma.ma200 = None;
        assert_eq!(ma.trend(), Trend::Undetermined);
    }
}
