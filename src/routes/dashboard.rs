use askama::Template;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::models::{Analysis, CompanyEntry, NewsItem};
use crate::services::chart::{render_candlestick_svg, ChartOptions};
use crate::services::report_composer::format_amount;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/analyze", get(analyze))
}

/// Helper to render templates into axum responses
fn render_template<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template render error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Template error: {}", e),
            )
                .into_response()
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub ticker: String,
    pub error: Option<String>,
    pub companies: Vec<CompanyEntry>,
    pub llm_enabled: bool,
    pub result: Option<AnalysisView>,
}

pub struct LabeledValue {
    pub label: String,
    pub value: String,
}

pub struct SectionView {
    pub title: String,
    pub body: String,
}

/// Display-ready projection of an [`Analysis`]
pub struct AnalysisView {
    pub ticker: String,
    pub company_name: String,
    pub summary: Option<String>,
    pub key_figures: Vec<LabeledValue>,
    pub profile: Vec<LabeledValue>,
    pub chart_svg: String,
    pub sections: Vec<SectionView>,
    pub preamble: String,
    pub report_error: Option<String>,
    pub news: Vec<NewsItem>,
    pub news_notice: Option<String>,
    pub generated_at: String,
}

fn price(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "N/A".to_string())
}

fn percent(value: Option<f64>) -> Option<String> {
    value.map(|v| format!("{:.2}%", v * 100.0))
}

impl From<Analysis> for AnalysisView {
    fn from(analysis: Analysis) -> Self {
        let market = &analysis.market;
        let ma = &market.moving_averages;

        let chart_svg = render_candlestick_svg(
            &market.prices,
            &ma.ma50_series,
            &ma.ma200_series,
            ChartOptions::default(),
        );

        let mut key_figures = vec![
            LabeledValue { label: "Last close".into(), value: price(market.prices.last_close()) },
            LabeledValue { label: "50-day MA".into(), value: price(ma.ma50) },
            LabeledValue { label: "200-day MA".into(), value: price(ma.ma200) },
            LabeledValue { label: "Trend".into(), value: analysis.trend.to_string() },
        ];
        if let Some(currency) = &market.currency {
            key_figures.push(LabeledValue { label: "Currency".into(), value: currency.clone() });
        }

        let mut profile = Vec::new();
        let mut summary = None;
        if let Some(p) = &market.profile {
            let rows = [
                ("Sector", p.sector.clone()),
                ("Industry", p.industry.clone()),
                ("Market cap", p.market_cap.map(format_amount)),
                ("Employees", p.employees.map(|e| e.to_string())),
                ("P/E (ttm)", p.trailing_pe.map(|v| format!("{:.2}", v))),
                ("Profit margin", percent(p.profit_margin)),
                ("Revenue growth", percent(p.revenue_growth)),
                ("Debt/Equity", p.debt_to_equity.map(|v| format!("{:.2}", v))),
            ];
            profile = rows
                .into_iter()
                .filter_map(|(label, value)| value.map(|value| LabeledValue { label: label.into(), value }))
                .collect();
            summary = p.summary.clone();
        }

        let (sections, preamble) = match &analysis.report {
            Some(report) => (
                report
                    .sections
                    .iter()
                    .map(|s| SectionView { title: s.title.clone(), body: s.body.clone() })
                    .collect(),
                report.preamble.clone(),
            ),
            None => (Vec::new(), String::new()),
        };

        Self {
            ticker: analysis.ticker.to_string(),
            company_name: analysis.company_name.clone(),
            summary,
            key_figures,
            profile,
            chart_svg,
            sections,
            preamble,
            report_error: analysis.report_error.clone(),
            news_notice: analysis.news_notice.clone(),
            generated_at: analysis.generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            news: analysis.news,
        }
    }
}

async fn index(State(state): State<AppState>) -> Response {
    info!("GET /");
    render_template(&DashboardPage {
        ticker: String::new(),
        error: None,
        companies: state.dashboard.directory().entries().to_vec(),
        llm_enabled: state.config.llm.api_key.is_some(),
        result: None,
    })
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    pub ticker: Option<String>,
}

/// Errors never escape as a failed request; they render as a banner
async fn analyze(Query(params): Query<AnalyzeParams>, State(state): State<AppState>) -> Response {
    let ticker = params.ticker.unwrap_or_default();
    info!("GET /analyze?ticker={}", ticker);

    let companies = state.dashboard.directory().entries().to_vec();
    let llm_enabled = state.config.llm.api_key.is_some();
    let page = match state.dashboard.analyze(&ticker).await {
        Ok(analysis) => DashboardPage {
            ticker: analysis.ticker.to_string(),
            error: None,
            companies,
            llm_enabled,
            result: Some(AnalysisView::from(analysis)),
        },
        Err(e) => {
            warn!("Analysis for {:?} failed: {}", ticker, e);
            DashboardPage {
                ticker,
                error: Some(e.to_string()),
                companies,
                llm_enabled,
                result: None,
            }
        }
    };

    render_template(&page)
}
