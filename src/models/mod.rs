mod analysis;
mod company;
mod market;
mod news;
mod report;
mod ticker;

pub use analysis::Analysis;
pub use company::{CompanyEntry, CompanyQueryParams};
pub use market::{
    CompanyProfile, FinancialStatement, MarketSnapshot, MovingAverages, PriceBar, PriceSeries,
    StatementKind, Trend,
};
pub use news::NewsItem;
pub use report::{Report, ReportSection, SectionKind};
pub use ticker::Ticker;
