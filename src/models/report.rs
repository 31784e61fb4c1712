use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    BusinessOverview,
    FinancialHealth,
    TechnicalAnalysis,
    NewsSummary,
    Recommendation,
}

impl SectionKind {
    pub const ALL: [SectionKind; 5] = [
        SectionKind::BusinessOverview,
        SectionKind::FinancialHealth,
        SectionKind::TechnicalAnalysis,
        SectionKind::NewsSummary,
        SectionKind::Recommendation,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::BusinessOverview => "Business Overview",
            SectionKind::FinancialHealth => "Financial Health",
            SectionKind::TechnicalAnalysis => "Technical Analysis",
            SectionKind::NewsSummary => "News Summary",
            SectionKind::Recommendation => "Recommendation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub kind: SectionKind,
    pub title: String,
    pub body: String,
}

/// A five-section narrative report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub sections: Vec<ReportSection>,
    /// Text the model emitted before the first recognized header
    pub preamble: String,
    pub raw: String,
}

impl Report {
    pub fn section(&self, kind: SectionKind) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn populated_count(&self) -> usize {
        self.sections.iter().filter(|s| !s.body.is_empty()).count()
    }
}
