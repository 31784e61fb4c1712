use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use crate::models::{CompanyEntry, CompanyQueryParams};

/// Sector -> company name -> symbol, as stored in the companies file
type RawDirectory = BTreeMap<String, BTreeMap<String, String>>;

/// Searchable list of known companies, grouped by sector
#[derive(Debug, Clone, Default)]
pub struct CompanyDirectory {
    entries: Vec<CompanyEntry>,
}

impl CompanyDirectory {
    /// Load from disk. A missing or malformed file yields an empty directory.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Company directory {} not readable: {}", path.display(), e);
                return Self::default();
            }
        };

        match Self::from_json(&contents) {
            Ok(directory) => {
                info!(
                    "Loaded {} companies in {} sectors from {}",
                    directory.entries.len(),
                    directory.sectors().len(),
                    path.display()
                );
                directory
            }
            Err(e) => {
                warn!("Invalid JSON in company directory {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: RawDirectory = serde_json::from_str(json)?;
        let entries = raw
            .into_iter()
            .flat_map(|(sector, companies)| {
                companies.into_iter().map(move |(name, symbol)| CompanyEntry {
                    sector: sector.clone(),
                    name,
                    symbol: symbol.trim().to_uppercase(),
                })
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sectors(&self) -> Vec<String> {
        let mut sectors: Vec<String> = self.entries.iter().map(|e| e.sector.clone()).collect();
        sectors.dedup();
        sectors
    }

    /// Filter by exact sector and a case-insensitive name (or symbol) fragment
    pub fn search(&self, params: &CompanyQueryParams) -> Vec<CompanyEntry> {
        let sector = params.sector.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let needle = params
            .q
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        self.entries
            .iter()
            .filter(|e| sector.map(|s| e.sector.eq_ignore_ascii_case(s)).unwrap_or(true))
            .filter(|e| match &needle {
                Some(n) => e.name.to_lowercase().contains(n) || e.symbol.to_lowercase() == *n,
                None => true,
            })
            .cloned()
            .collect()
    }

    pub fn name_for(&self, symbol: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.symbol.eq_ignore_ascii_case(symbol))
            .map(|e| e.name.as_str())
    }

    pub fn entries(&self) -> &[CompanyEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "Technology": {"Apple Inc.": "AAPL", "Microsoft Corporation": "MSFT"},
        "Consumer Discretionary": {"Amazon.com Inc.": "amzn", "Tesla Inc.": "TSLA"}
    }"#;

    fn directory() -> CompanyDirectory {
        CompanyDirectory::from_json(SAMPLE).unwrap()
    }

    #[test]
    fn test_sectors_are_sorted_and_unique() {
        assert_eq!(directory().sectors(), vec!["Consumer Discretionary", "Technology"]);
        assert_eq!(directory().len(), 4);
    }

    #[test]
    fn test_search_by_sector_and_name() {
        let params = CompanyQueryParams { sector: Some("technology".into()), q: Some("micro".into()) };
        let hits = directory().search(&params);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].symbol, "MSFT");
    }

    #[test]
    fn test_search_without_filters_returns_everything() {
        assert_eq!(directory().search(&CompanyQueryParams::default()).len(), 4);
    }

    #[test]
    fn test_search_no_match() {
        let params = CompanyQueryParams { sector: None, q: Some("nonexistent".into()) };
        assert!(directory().search(&params).is_empty());
    }

    #[test]
    fn test_name_for_symbol_is_case_insensitive() {
        assert_eq!(directory().name_for("amzn"), Some("Amazon.com Inc."));
        assert_eq!(directory().name_for("ZZZZ"), None);
    }

    #[test]
    fn test_missing_file_is_empty() {
        assert!(CompanyDirectory::load("does/not/exist.json").is_empty());
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(CompanyDirectory::from_json("[1, 2").is_err());
    }
}
