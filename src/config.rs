use std::time::Duration;

use crate::models::SectionKind;

/// Process-wide configuration, read once at startup and handed to each component.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub market: MarketConfig,
    pub news: NewsConfig,
    pub llm: LlmConfig,
    pub report: ReportConfig,
    pub directory: DirectoryConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_source<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let http_timeout = parse_or(&lookup, "HTTP_TIMEOUT_SECS", 10u64);

        let server_defaults = ServerConfig::default();
        let server = ServerConfig {
            host: lookup("HOST").unwrap_or(server_defaults.host),
            port: parse_or(&lookup, "PORT", server_defaults.port),
        };

        let market_defaults = MarketConfig::default();
        let market = MarketConfig {
            chart_base_url: lookup("YAHOO_CHART_URL").unwrap_or(market_defaults.chart_base_url),
            fundamentals_base_url: lookup("YAHOO_FUNDAMENTALS_URL")
                .unwrap_or(market_defaults.fundamentals_base_url),
            history_range: lookup("PRICE_HISTORY_RANGE").unwrap_or(market_defaults.history_range),
            timeout: Duration::from_secs(http_timeout),
        };

        let news_defaults = NewsConfig::default();
        let news = NewsConfig {
            yahoo_search_url: lookup("YAHOO_SEARCH_URL").unwrap_or(news_defaults.yahoo_search_url),
            finnhub_api_key: lookup("FINNHUB_API_KEY").filter(|k| !k.trim().is_empty()),
            finnhub_base_url: lookup("FINNHUB_BASE_URL").unwrap_or(news_defaults.finnhub_base_url),
            lookback_days: parse_or(&lookup, "NEWS_LOOKBACK_DAYS", news_defaults.lookback_days),
            max_items_per_source: parse_or(&lookup, "NEWS_MAX_PER_SOURCE", news_defaults.max_items_per_source),
            max_total_items: parse_or(&lookup, "NEWS_MAX_TOTAL", news_defaults.max_total_items),
            scraping_enabled: parse_or(&lookup, "SCRAPING_ENABLED", news_defaults.scraping_enabled),
            timeout: Duration::from_secs(http_timeout),
        };

        let llm_defaults = LlmConfig::default();
        let llm = LlmConfig {
            api_key: lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
            base_url: lookup("OPENAI_BASE_URL").unwrap_or(llm_defaults.base_url),
            model: lookup("OPENAI_MODEL").unwrap_or(llm_defaults.model),
            temperature: parse_or(&lookup, "LLM_TEMPERATURE", llm_defaults.temperature),
            max_tokens: parse_or(&lookup, "LLM_MAX_TOKENS", llm_defaults.max_tokens),
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "LLM_TIMEOUT_SECS",
                llm_defaults.timeout.as_secs(),
            )),
        };

        let directory = DirectoryConfig {
            companies_file: lookup("COMPANIES_FILE")
                .unwrap_or_else(|| DirectoryConfig::default().companies_file),
        };

        Self {
            server,
            market,
            news,
            llm,
            report: ReportConfig::default(),
            directory,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring unparsable value for {}: {:?}", key, raw);
                default
            }
        },
        None => default,
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub chart_base_url: String,
    pub fundamentals_base_url: String,
    /// Yahoo range token, e.g. "6mo", "1y", "2y"
    pub history_range: String,
    pub timeout: Duration,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            chart_base_url: "https://query1.finance.yahoo.com".to_string(),
            fundamentals_base_url: "https://query2.finance.yahoo.com".to_string(),
            history_range: "1y".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub yahoo_search_url: String,
    pub finnhub_api_key: Option<String>,
    pub finnhub_base_url: String,
    pub lookback_days: i64,
    pub max_items_per_source: usize,
    pub max_total_items: usize,
    pub scraping_enabled: bool,
    pub timeout: Duration,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            yahoo_search_url: "https://query2.finance.yahoo.com".to_string(),
            finnhub_api_key: None,
            finnhub_base_url: "https://finnhub.io".to_string(),
            lookback_days: 7,
            max_items_per_source: 5,
            max_total_items: 5,
            scraping_enabled: true,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4-turbo".to_string(),
            temperature: 0.3,
            max_tokens: 1800,
            timeout: Duration::from_secs(60),
        }
    }
}

/// One expected report section and the header spellings accepted for it
#[derive(Debug, Clone)]
pub struct SectionSpec {
    pub kind: SectionKind,
    pub title: String,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Expected section headers, in report order
    pub sections: Vec<SectionSpec>,
    /// How many headlines are embedded into the prompt
    pub prompt_headlines: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        let spec = |kind: SectionKind, aliases: &[&str]| SectionSpec {
            kind,
            title: kind.title().to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        };

        Self {
            sections: vec![
                spec(
                    SectionKind::BusinessOverview,
                    &["business overview", "company overview", "overview"],
                ),
                spec(
                    SectionKind::FinancialHealth,
                    &["financial health", "financial analysis", "financials"],
                ),
                spec(
                    SectionKind::TechnicalAnalysis,
                    &["technical analysis", "technical indicators", "technicals"],
                ),
                spec(
                    SectionKind::NewsSummary,
                    &["news summary", "recent developments", "recent news", "news"],
                ),
                spec(
                    SectionKind::Recommendation,
                    &["investment recommendation", "recommendation", "conclusion"],
                ),
            ],
            prompt_headlines: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub companies_file: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            companies_file: "data/us_stocks.json".to_string(),
        }
    }
}
