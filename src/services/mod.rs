pub mod chart;
pub mod company_directory;
pub mod dashboard_service;
pub mod indicators;
pub mod llm_service;
pub mod market_data_service;
pub mod markup;
pub mod news_aggregator;
pub mod press_releases;
pub mod report_composer;
