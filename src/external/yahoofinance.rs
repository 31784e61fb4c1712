use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::config::MarketConfig;
use crate::external::market_provider::{MarketDataError, MarketDataProvider, PriceHistory};
use crate::models::{CompanyProfile, FinancialStatement, PriceBar, StatementKind, Ticker};

pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (compatible; FinBuddy/0.1)";

/// Yahoo Finance provider. No API key required.
///
/// Prices come from the v8 chart endpoint, statements from the
/// fundamentals-timeseries endpoint and the profile from quoteSummary.
pub struct YahooFinanceProvider {
    client: reqwest::Client,
    chart_base_url: String,
    fundamentals_base_url: String,
}

impl YahooFinanceProvider {
    pub fn new(config: &MarketConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(BROWSER_USER_AGENT)
                .timeout(config.timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            chart_base_url: config.chart_base_url.trim_end_matches('/').to_string(),
            fundamentals_base_url: config.fundamentals_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, String)],
        ticker: &Ticker,
    ) -> Result<T, MarketDataError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                error!("Yahoo Finance request failed for {}: {}", ticker, e);
                MarketDataError::Network(e.to_string())
            })?;

        let status = resp.status();
        if status.as_u16() == 404 {
            return Err(MarketDataError::NotFound(ticker.to_string()));
        }
        if status.as_u16() == 429 {
            return Err(MarketDataError::RateLimited);
        }
        if !status.is_success() {
            return Err(MarketDataError::BadResponse(format!("HTTP {}", status)));
        }

        resp.json::<T>()
            .await
            .map_err(|e| MarketDataError::Parse(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Chart endpoint
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    #[serde(default)]
    meta: YahooMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooMeta {
    currency: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    #[serde(default)]
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

fn chart_to_history(body: YahooChartResponse, ticker: &Ticker) -> Result<PriceHistory, MarketDataError> {
    if let Some(error) = body.chart.error {
        if error.description.contains("No data found") {
            return Err(MarketDataError::NotFound(ticker.to_string()));
        }
        return Err(MarketDataError::BadResponse(error.description));
    }

    let result = body
        .chart
        .result
        .and_then(|mut results| if results.is_empty() { None } else { Some(results.remove(0)) })
        .ok_or_else(|| MarketDataError::NotFound(ticker.to_string()))?;

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let at = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

    // Skip bars with missing prices (market holidays, halted sessions)
    let bars: Vec<PriceBar> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let date = chrono::DateTime::from_timestamp(*ts, 0)?.date_naive();
            Some(PriceBar {
                date,
                open: at(&quote.open, i)?,
                high: at(&quote.high, i)?,
                low: at(&quote.low, i)?,
                close: at(&quote.close, i)?,
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
            })
        })
        .collect();

    if bars.is_empty() {
        return Err(MarketDataError::NotFound(ticker.to_string()));
    }

    Ok(PriceHistory {
        bars,
        currency: result.meta.currency,
        long_name: result.meta.long_name.or(result.meta.short_name),
    })
}

// ---------------------------------------------------------------------------
// Fundamentals and profile payloads (loosely typed, read through serde_json::Value)
// ---------------------------------------------------------------------------

fn statement_type_names(kind: StatementKind) -> Vec<String> {
    kind.line_items()
        .iter()
        .map(|item| format!("annual{}", item))
        .collect()
}

fn parse_statement(body: &Value, kind: StatementKind) -> Result<FinancialStatement, MarketDataError> {
    let results = body["timeseries"]["result"]
        .as_array()
        .ok_or_else(|| MarketDataError::Parse("missing timeseries.result".into()))?;

    let mut statement = FinancialStatement::empty(kind);

    for series in results {
        let Some(type_name) = series["meta"]["type"][0].as_str() else {
            continue;
        };
        let item = type_name.trim_start_matches("annual");
        let Some(entries) = series[type_name].as_array() else {
            continue;
        };

        for entry in entries {
            let date = entry["asOfDate"]
                .as_str()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
            let value = raw_number(&entry["reportedValue"]);
            if let (Some(date), Some(value)) = (date, value) {
                statement.insert(date, item, value);
            }
        }
    }

    Ok(statement)
}

/// Yahoo wraps most numbers as `{"raw": 1.0, "fmt": "1.00"}`
fn raw_number(value: &Value) -> Option<f64> {
    value["raw"].as_f64().or_else(|| value.as_f64())
}

fn parse_profile(body: &Value) -> Result<CompanyProfile, MarketDataError> {
    let result = &body["quoteSummary"]["result"][0];
    if result.is_null() {
        let description = body["quoteSummary"]["error"]["description"]
            .as_str()
            .unwrap_or("empty quoteSummary result");
        return Err(MarketDataError::BadResponse(description.to_string()));
    }

    let text = |v: &Value| v.as_str().map(str::to_string).filter(|s| !s.is_empty());

    Ok(CompanyProfile {
        name: text(&result["price"]["longName"]).or_else(|| text(&result["price"]["shortName"])),
        sector: text(&result["assetProfile"]["sector"]),
        industry: text(&result["assetProfile"]["industry"]),
        market_cap: raw_number(&result["price"]["marketCap"])
            .or_else(|| raw_number(&result["summaryDetail"]["marketCap"])),
        employees: result["assetProfile"]["fullTimeEmployees"].as_u64(),
        trailing_pe: raw_number(&result["summaryDetail"]["trailingPE"]),
        profit_margin: raw_number(&result["financialData"]["profitMargins"])
            .or_else(|| raw_number(&result["defaultKeyStatistics"]["profitMargins"])),
        revenue_growth: raw_number(&result["financialData"]["revenueGrowth"]),
        debt_to_equity: raw_number(&result["financialData"]["debtToEquity"]),
        summary: text(&result["assetProfile"]["longBusinessSummary"]),
    })
}

#[async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &Ticker,
        range: &str,
    ) -> Result<PriceHistory, MarketDataError> {
        let url = format!("{}/v8/finance/chart/{}", self.chart_base_url, ticker);

        let body: YahooChartResponse = self
            .get_json(
                &url,
                &[
                    ("interval", "1d".to_string()),
                    ("range", range.to_string()),
                    ("includeAdjustedClose", "true".to_string()),
                ],
                ticker,
            )
            .await?;

        let history = chart_to_history(body, ticker)?;
        info!("Fetched {} daily bars for {} (range {})", history.bars.len(), ticker, range);
        Ok(history)
    }

    async fn fetch_statement(
        &self,
        ticker: &Ticker,
        kind: StatementKind,
    ) -> Result<FinancialStatement, MarketDataError> {
        let url = format!(
            "{}/ws/fundamentals-timeseries/v1/finance/timeseries/{}",
            self.fundamentals_base_url, ticker
        );
        let now = Utc::now();
        let five_years_ago = now - Duration::days(5 * 366);

        let body: Value = self
            .get_json(
                &url,
                &[
                    ("symbol", ticker.to_string()),
                    ("type", statement_type_names(kind).join(",")),
                    ("period1", five_years_ago.timestamp().to_string()),
                    ("period2", now.timestamp().to_string()),
                ],
                ticker,
            )
            .await?;

        let statement = parse_statement(&body, kind)?;
        info!(
            "Fetched {} for {} ({} periods)",
            kind.label(),
            ticker,
            statement.periods.len()
        );
        Ok(statement)
    }

    async fn fetch_profile(&self, ticker: &Ticker) -> Result<CompanyProfile, MarketDataError> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.chart_base_url, ticker);

        let body: Value = self
            .get_json(
                &url,
                &[(
                    "modules",
                    "assetProfile,price,summaryDetail,financialData,defaultKeyStatistics".to_string(),
                )],
                ticker,
            )
            .await?;

        parse_profile(&body)
    }
}
