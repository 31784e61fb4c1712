pub mod finnhub;
pub mod market_provider;
pub mod news_provider;
pub mod yahoo_news;
pub mod yahoofinance;
