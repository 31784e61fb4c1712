mod common;

use common::{dashboard, NewsBehavior, Setup};
use finbuddy::errors::AppError;
use finbuddy::models::{SectionKind, Trend};

const MISSING_RECOMMENDATION: &str = "\
## Business Overview
a
## Financial Health
b
## Technical Analysis
c
## News Summary
d";

#[tokio::test]
async fn full_year_of_prices_gives_expected_moving_averages() {
    let analysis = dashboard(Setup::default()).analyze("aapl").await.unwrap();

    let closes = analysis.market.prices.closes();
    let mean = |n: usize| closes[closes.len() - n..].iter().sum::<f64>() / n as f64;

    assert_eq!(analysis.market.prices.len(), 252);
    assert_eq!(analysis.market.moving_averages.ma50, Some(mean(50)));
    assert_eq!(analysis.market.moving_averages.ma200, Some(mean(200)));
    assert_eq!(analysis.trend, Trend::Bullish);
}

#[tokio::test]
async fn company_name_prefers_directory_entry() {
    let analysis = dashboard(Setup::default()).analyze("AAPL").await.unwrap();
    assert_eq!(analysis.company_name, "Apple Inc.");

    let analysis = dashboard(Setup::default()).analyze("MSFT").await.unwrap();
    assert_eq!(analysis.company_name, "MSFT Holdings");
}

#[tokio::test]
async fn unknown_ticker_is_data_unavailable() {
    let err = dashboard(Setup::default()).analyze("ZZZZ").await.unwrap_err();
    assert!(matches!(err, AppError::DataUnavailable(_)));
}

#[tokio::test]
async fn invalid_ticker_is_rejected_before_fetching() {
    let err = dashboard(Setup::default()).analyze("not a ticker!").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn failing_primary_with_secondary_returns_secondary_items() {
    let setup = Setup {
        primary: NewsBehavior::Fail,
        secondary: Some(NewsBehavior::Items(3)),
        ..Setup::default()
    };
    let analysis = dashboard(setup).analyze("TSLA").await.unwrap();

    assert_eq!(analysis.news.len(), 3);
    assert!(analysis.news.iter().all(|n| n.source == "Secondary"));
    assert!(analysis.news_notice.is_none());
}

#[tokio::test]
async fn no_news_continues_with_notice() {
    let setup = Setup { primary: NewsBehavior::Items(0), ..Setup::default() };
    let analysis = dashboard(setup).analyze("TSLA").await.unwrap();

    assert!(analysis.news.is_empty());
    assert!(analysis.news_notice.unwrap().contains("TSLA"));
    assert!(analysis.report.is_some());
}

#[tokio::test]
async fn missing_recommendation_header_leaves_one_empty_section() {
    let setup = Setup { llm_reply: Some(MISSING_RECOMMENDATION), ..Setup::default() };
    let report = dashboard(setup).analyze("AAPL").await.unwrap().report.unwrap();

    assert_eq!(report.sections.len(), 5);
    assert_eq!(report.populated_count(), 4);
    assert!(report.section(SectionKind::Recommendation).unwrap().body.is_empty());
}

#[tokio::test]
async fn report_failure_keeps_market_data_and_news() {
    let setup = Setup { llm_reply: None, ..Setup::default() };
    let analysis = dashboard(setup).analyze("AAPL").await.unwrap();

    assert!(analysis.report.is_none());
    assert!(analysis.report_error.unwrap().contains("upstream exploded"));
    assert_eq!(analysis.news.len(), 3);
    assert_eq!(analysis.market.prices.len(), 252);
}

#[tokio::test]
async fn strict_report_surfaces_each_stage_error() {
    let no_news = Setup { primary: NewsBehavior::Fail, ..Setup::default() };
    let err = dashboard(no_news).report("AAPL").await.unwrap_err();
    assert!(matches!(err, AppError::NoNewsAvailable(_)));

    let llm_down = Setup { llm_reply: None, ..Setup::default() };
    let err = dashboard(llm_down).report("AAPL").await.unwrap_err();
    assert!(matches!(err, AppError::GenerationFailed(_)));
}
