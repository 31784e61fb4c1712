use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use finbuddy::app;
use finbuddy::config::AppConfig;
use finbuddy::external::yahoofinance::YahooFinanceProvider;
use finbuddy::logging::{init_logging, LoggingConfig};
use finbuddy::services::company_directory::CompanyDirectory;
use finbuddy::services::dashboard_service::DashboardService;
use finbuddy::services::llm_service::LlmService;
use finbuddy::services::market_data_service::MarketDataService;
use finbuddy::services::news_aggregator::NewsAggregator;
use finbuddy::services::report_composer::ReportComposer;
use finbuddy::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let config = AppConfig::from_env();

    let market = MarketDataService::new(
        Arc::new(YahooFinanceProvider::new(&config.market)),
        &config.market,
    );
    let news = NewsAggregator::from_config(&config.news);
    let llm = Arc::new(LlmService::new(&config.llm));
    let composer = ReportComposer::new(llm, config.report.clone());
    let directory = CompanyDirectory::load(&config.directory.companies_file);

    let dashboard = DashboardService::new(
        Arc::new(market),
        Arc::new(news),
        Arc::new(composer),
        Arc::new(directory),
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;

    let state = AppState {
        dashboard: Arc::new(dashboard),
        config: Arc::new(config),
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("FinBuddy running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
