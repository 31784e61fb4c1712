use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single headline from any news source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub source: String,
    pub headline: String,
    pub url: String,
    /// Scraped press releases often carry no date
    pub published_at: Option<DateTime<Utc>>,
    pub body_snippet: String,
}

impl NewsItem {
    pub fn published_label(&self) -> String {
        self.published_at
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default()
    }
}
