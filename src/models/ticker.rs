use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::AppError;

/// An upper-cased stock symbol, validated once at the edge of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    pub const MAX_LEN: usize = 12;

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let symbol = raw.trim().to_uppercase();

        if symbol.is_empty() {
            return Err(AppError::Validation("Please enter a ticker symbol".to_string()));
        }
        if symbol.len() > Self::MAX_LEN {
            return Err(AppError::Validation(format!(
                "Ticker '{}' is longer than {} characters",
                symbol,
                Self::MAX_LEN
            )));
        }

        let mut chars = symbol.chars();
        let first_ok = chars
            .next()
            .map(|c| c.is_ascii_alphanumeric() || c == '^')
            .unwrap_or(false);
        let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '=' | '^'));

        if !first_ok || !rest_ok {
            return Err(AppError::Validation(format!(
                "Ticker '{}' contains invalid characters",
                symbol
            )));
        }

        Ok(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let ticker = Ticker::parse("  aapl ").unwrap();
        assert_eq!(ticker.as_str(), "AAPL");
    }

    #[test]
    fn test_parse_accepts_exchange_suffixes_and_indices() {
        assert!(Ticker::parse("RY.TO").is_ok());
        assert!(Ticker::parse("BRK-B").is_ok());
        assert!(Ticker::parse("^GSPC").is_ok());
        assert!(Ticker::parse("EURUSD=X").is_ok());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(Ticker::parse(""), Err(AppError::Validation(_))));
        assert!(matches!(Ticker::parse("AA PL"), Err(AppError::Validation(_))));
        assert!(matches!(Ticker::parse("../etc"), Err(AppError::Validation(_))));
        assert!(matches!(Ticker::parse("ABCDEFGHIJKLMN"), Err(AppError::Validation(_))));
    }
}
