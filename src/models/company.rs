use serde::{Deserialize, Serialize};

/// A listed company from the sector directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyEntry {
    pub sector: String,
    pub name: String,
    pub symbol: String,
}

/// Query parameters for the company directory search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyQueryParams {
    pub sector: Option<String>,
    pub q: Option<String>,
}
