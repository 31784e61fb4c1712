use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{ReportConfig, SectionSpec};
use crate::errors::AppError;
use crate::models::{
    CompanyProfile, FinancialStatement, MarketSnapshot, NewsItem, Report, ReportSection, SectionKind,
};
use crate::services::llm_service::LlmService;

/// Fixed system instruction sent with every report request
pub const SYSTEM_INSTRUCTION: &str = "You are a professional financial analyst. \
Write factual, balanced equity research using only the context supplied by the user. \
When a figure is missing from the context, say so instead of guessing.";

/// Everything the composer needs for one report
pub struct ReportInput<'a> {
    pub company_name: &'a str,
    pub market: &'a MarketSnapshot,
    pub news: &'a [NewsItem],
}

pub struct ReportComposer {
    llm: Arc<LlmService>,
    config: ReportConfig,
}

impl ReportComposer {
    pub fn new(llm: Arc<LlmService>, config: ReportConfig) -> Self {
        Self { llm, config }
    }

    /// Build the prompt, call the model once and split the answer into sections
    pub async fn compose(&self, input: &ReportInput<'_>) -> Result<Report, AppError> {
        let ticker = &input.market.ticker;
        let prompt = self.build_prompt(input);
        info!(
            "Requesting report for {} (model: {}, prompt: {} chars)",
            ticker,
            self.llm.model().unwrap_or("none"),
            prompt.len()
        );

        let raw = self
            .llm
            .generate_completion(SYSTEM_INSTRUCTION, prompt)
            .await
            .map_err(|e| {
                error!("Report generation failed for {}: {}", ticker, e);
                AppError::from(e)
            })?;

        let report = parse_report(&raw, &self.config.sections);
        let populated = report.populated_count();
        if populated < SectionKind::ALL.len() {
            warn!(
                "Report for {} has {} of {} sections populated",
                ticker,
                populated,
                SectionKind::ALL.len()
            );
        }
        Ok(report)
    }

    /// Retrieval-augmented prompt: fetched facts first, then section instructions
    pub fn build_prompt(&self, input: &ReportInput<'_>) -> String {
        let market = input.market;
        let mut out = String::new();

        let _ = writeln!(out, "Company: {} ({})\n", input.company_name, market.ticker);

        if let Some(profile) = &market.profile {
            out.push_str(&format_profile(profile));
        }

        out.push_str(&format_statement(&market.income, &[
            ("TotalRevenue", "Revenue"),
            ("GrossProfit", "Gross Profit"),
            ("OperatingIncome", "Operating Income"),
            ("NetIncome", "Net Income"),
            ("EBITDA", "EBITDA"),
        ]));
        out.push_str(&format_statement(&market.balance_sheet, &[
            ("TotalAssets", "Total Assets"),
            ("TotalLiabilitiesNetMinorityInterest", "Total Liabilities"),
            ("StockholdersEquity", "Shareholders' Equity"),
            ("CashAndCashEquivalents", "Cash"),
            ("TotalDebt", "Total Debt"),
        ]));

        let ma = &market.moving_averages;
        out.push_str("## Technical Indicators\n");
        if let Some(close) = market.prices.last_close() {
            let _ = writeln!(out, "- Current Price: ${:.2}", close);
        }
        let _ = writeln!(out, "- 50-day MA: {}", optional_price(ma.ma50));
        let _ = writeln!(out, "- 200-day MA: {}", optional_price(ma.ma200));
        let _ = writeln!(out, "- Trend: {}", ma.trend());
        let _ = writeln!(out, "- Trading days analysed: {}\n", market.prices.len());

        let headlines: Vec<&NewsItem> = input.news.iter().take(self.config.prompt_headlines).collect();
        if headlines.is_empty() {
            out.push_str("## Recent News Highlights\n- No recent news available\n\n");
        } else {
            out.push_str("## Recent News Highlights\n");
            for item in headlines {
                let date = item.published_label();
                if date.is_empty() {
                    let _ = writeln!(out, "- {} ({})", item.headline, item.source);
                } else {
                    let _ = writeln!(out, "- {} ({}, {})", item.headline, item.source, date);
                }
            }
            out.push('\n');
        }

        out.push_str("---\n\n");
        let _ = writeln!(
            out,
            "Create a detailed {}-part analysis report for {} ({}). \
             Use exactly these markdown headings, in this order:",
            SectionKind::ALL.len(),
            input.company_name,
            market.ticker
        );
        for kind in SectionKind::ALL {
            let _ = writeln!(out, "## {}", section_title(&self.config.sections, kind));
        }
        out.push_str("\nUse a professional tone with bullet points under each heading.");

        out
    }
}

fn section_title(specs: &[SectionSpec], kind: SectionKind) -> String {
    specs
        .iter()
        .find(|s| s.kind == kind)
        .map(|s| s.title.clone())
        .unwrap_or_else(|| kind.title().to_string())
}

fn optional_price(value: Option<f64>) -> String {
    value
        .map(|v| format!("${:.2}", v))
        .unwrap_or_else(|| "N/A (not enough history)".to_string())
}

/// $1.23T / $4.56B / $7.89M style amounts
pub fn format_amount(value: f64) -> String {
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    if abs >= 1e12 {
        format!("{}${:.2}T", sign, abs / 1e12)
    } else if abs >= 1e9 {
        format!("{}${:.2}B", sign, abs / 1e9)
    } else if abs >= 1e6 {
        format!("{}${:.2}M", sign, abs / 1e6)
    } else {
        format!("{}${:.2}", sign, abs)
    }
}

fn format_profile(profile: &CompanyProfile) -> String {
    let na = || "N/A".to_string();
    let mut out = String::from("## Basic Information\n");
    let _ = writeln!(out, "- Sector: {}", profile.sector.clone().unwrap_or_else(na));
    let _ = writeln!(out, "- Industry: {}", profile.industry.clone().unwrap_or_else(na));
    let _ = writeln!(out, "- Market Cap: {}", profile.market_cap.map(format_amount).unwrap_or_else(na));
    let _ = writeln!(out, "- Employees: {}", profile.employees.map(|e| e.to_string()).unwrap_or_else(na));
    out.push('\n');

    out.push_str("## Financial Metrics\n");
    let _ = writeln!(out, "- P/E Ratio: {}", profile.trailing_pe.map(|v| format!("{:.2}", v)).unwrap_or_else(na));
    let _ = writeln!(out, "- Profit Margin: {}", profile.profit_margin.map(|v| format!("{:.2}%", v * 100.0)).unwrap_or_else(na));
    let _ = writeln!(out, "- Revenue Growth: {}", profile.revenue_growth.map(|v| format!("{:.2}%", v * 100.0)).unwrap_or_else(na));
    let _ = writeln!(out, "- Debt/Equity: {}", profile.debt_to_equity.map(|v| format!("{:.2}", v)).unwrap_or_else(na));
    out.push('\n');
    out
}

fn format_statement(statement: &FinancialStatement, items: &[(&str, &str)]) -> String {
    let Some((period, values)) = statement.latest() else {
        return format!("## {}\n- Not available\n\n", statement.kind.label());
    };

    let mut out = format!("## {} (period ending {})\n", statement.kind.label(), period);
    for (key, label) in items {
        if let Some(value) = values.get(*key) {
            let _ = writeln!(out, "- {}: {}", label, format_amount(*value));
        }
    }
    out.push('\n');
    out
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Split model output into the five report sections.
///
/// Headers are matched case-insensitively against the configured aliases
/// (see `match_header`). Bullet and quote lines are never headers. Missing headers leave an
/// empty section. Output with no recognizable header at all lands in the last
/// section. Text ahead of the first header is kept as the preamble.
pub fn parse_report(text: &str, specs: &[SectionSpec]) -> Report {
    let kinds = SectionKind::ALL;

    // (section index, lower-cased alias), longest alias first so that
    // "recent news" wins over "news"
    let mut aliases: Vec<(usize, String)> = kinds
        .iter()
        .enumerate()
        .flat_map(|(idx, kind)| {
            let configured: Vec<String> = specs
                .iter()
                .filter(|s| s.kind == *kind)
                .flat_map(|s| s.aliases.iter().map(|a| a.to_lowercase()))
                .collect();
            let list = if configured.is_empty() {
                vec![kind.title().to_lowercase()]
            } else {
                configured
            };
            list.into_iter().map(move |a| (idx, a))
        })
        .collect();
    aliases.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    let mut bodies: Vec<Vec<String>> = vec![Vec::new(); kinds.len()];
    let mut preamble: Vec<String> = Vec::new();
    let mut current: Option<usize> = None;

    for line in text.lines() {
        if let Some((idx, inline)) = match_header(line, &aliases) {
            current = Some(idx);
            if !inline.is_empty() {
                bodies[idx].push(inline);
            }
            continue;
        }
        match current {
            Some(idx) => bodies[idx].push(line.to_string()),
            None => preamble.push(line.to_string()),
        }
    }

    if current.is_none() {
        let last = kinds.len() - 1;
        bodies[last] = std::mem::take(&mut preamble);
    }

    let sections = kinds
        .iter()
        .zip(bodies)
        .map(|(kind, lines)| ReportSection {
            kind: *kind,
            title: section_title(specs, *kind),
            body: lines.join("\n").trim().to_string(),
        })
        .collect();

    Report {
        sections,
        preamble: preamble.join("\n").trim().to_string(),
        raw: text.to_string(),
    }
}

fn is_emphasis(c: char) -> bool {
    matches!(c, '*' | '_')
}

/// Bullets, quotes and rules are always body text
fn is_list_item(line: &str) -> bool {
    line.starts_with(['-', '+', '>'])
        || line
            .strip_prefix('*')
            .map(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
            .unwrap_or(false)
}

/// Strip a leading "1." / "2)" / "III." style list marker
fn strip_numbering(s: &str) -> (&str, bool) {
    let digits = s.trim_start_matches(|c: char| c.is_ascii_digit());
    let roman = s.trim_start_matches(|c: char| matches!(c, 'I' | 'V' | 'X'));
    for rest in [digits, roman] {
        if rest.len() < s.len() {
            if let Some(after) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
                return (after.trim_start(), true);
            }
        }
    }
    (s, false)
}

/// Returns the section index and any inline body text after "Header:".
///
/// A line is a header when, once `#`, numbering and emphasis are removed, it
/// equals an alias. `#` headings may also just start with an alias. Bare and
/// emphasized lines may carry inline text after `Alias:`. Numbered lines must
/// match exactly.
fn match_header(line: &str, aliases: &[(usize, String)]) -> Option<(usize, String)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || is_list_item(trimmed) {
        return None;
    }

    let heading = trimmed.starts_with('#');
    let (text, numbered) = strip_numbering(trimmed.trim_start_matches('#').trim_start());
    let candidate = text.trim_start_matches(is_emphasis).trim_start();

    let lower = candidate.to_lowercase();
    let bare = lower.trim_end_matches(|c: char| c == ':' || is_emphasis(c) || c.is_whitespace());

    for (idx, alias) in aliases {
        if bare == alias {
            return Some((*idx, String::new()));
        }

        let Some(rest) = lower.strip_prefix(alias.as_str()) else {
            continue;
        };

        // "**Recommendation:** Buy" keeps "Buy" as body text
        if heading || !numbered {
            if let Some(after) = rest.trim_start_matches(is_emphasis).strip_prefix(':') {
                let start = candidate.len().saturating_sub(after.len());
                let inline = candidate
                    .get(start..)
                    .unwrap_or(after)
                    .trim_matches(|c: char| is_emphasis(c) || c.is_whitespace());
                return Some((*idx, inline.to_string()));
            }
        }

        if heading && !rest.starts_with(char::is_alphanumeric) {
            return Some((*idx, String::new()));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LlmError;
    use crate::models::{MovingAverages, PriceBar, PriceSeries, StatementKind, Ticker};
    use crate::services::llm_service::LlmProvider;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn specs() -> Vec<SectionSpec> {
        ReportConfig::default().sections
    }

    fn body(report: &Report, kind: SectionKind) -> &str {
        &report.section(kind).unwrap().body
    }

    const FULL: &str = "\
Here is the analysis you asked for.

## 1) Business Overview
Apple designs consumer hardware.

## 2) Financial Health
- Strong cash position

## Technical Analysis
Price above both averages.

### Recent Developments
- New product launch

## 5) Investment Recommendation
Hold.
";

    #[test]
    fn test_parse_all_sections() {
        let report = parse_report(FULL, &specs());

        assert_eq!(report.sections.len(), 5);
        assert_eq!(body(&report, SectionKind::BusinessOverview), "Apple designs consumer hardware.");
        assert_eq!(body(&report, SectionKind::FinancialHealth), "- Strong cash position");
        assert_eq!(body(&report, SectionKind::TechnicalAnalysis), "Price above both averages.");
        assert_eq!(body(&report, SectionKind::NewsSummary), "- New product launch");
        assert_eq!(body(&report, SectionKind::Recommendation), "Hold.");
        assert_eq!(report.preamble, "Here is the analysis you asked for.");
    }

    #[test]
    fn test_missing_recommendation_header_leaves_empty_section() {
        let text = "\
## Business Overview
Overview text
## Financial Health
Health text
## Technical Analysis
Technical text
## News Summary
News text
Closing remarks that belong to the news block.";

        let report = parse_report(text, &specs());

        assert_eq!(report.sections.len(), 5);
        assert_eq!(report.populated_count(), 4);
        assert_eq!(body(&report, SectionKind::Recommendation), "");
        assert!(body(&report, SectionKind::NewsSummary).ends_with("belong to the news block."));
    }

    #[test]
    fn test_no_headers_puts_everything_in_last_section() {
        let report = parse_report("Just a paragraph of text.\nAnd another.", &specs());

        assert_eq!(report.sections.len(), 5);
        assert_eq!(report.populated_count(), 1);
        assert_eq!(body(&report, SectionKind::Recommendation), "Just a paragraph of text.\nAnd another.");
        assert!(report.preamble.is_empty());
    }

    #[test]
    fn test_empty_output_still_has_five_sections() {
        let report = parse_report("", &specs());
        assert_eq!(report.sections.len(), 5);
        assert_eq!(report.populated_count(), 0);
    }

    #[test]
    fn test_bold_and_inline_headers() {
        let text = "\
**Business Overview**
Makes phones.
**Recommendation:** Buy on dips";

        let report = parse_report(text, &specs());
        assert_eq!(body(&report, SectionKind::BusinessOverview), "Makes phones.");
        assert_eq!(body(&report, SectionKind::Recommendation), "Buy on dips");
    }

    #[test]
    fn test_body_lines_starting_with_alias_words_are_not_headers() {
        let text = "\
## News Summary
News flow has been positive this quarter.
Recommendation engines are a growth area.";

        let report = parse_report(text, &specs());
        assert_eq!(
            body(&report, SectionKind::NewsSummary),
            "News flow has been positive this quarter.\nRecommendation engines are a growth area."
        );
        assert_eq!(body(&report, SectionKind::Recommendation), "");
    }

    #[test]
    fn test_list_items_starting_with_alias_words_stay_in_their_section() {
        let text = "\
## Financial Health
* News of strong iPhone sales lifted margins
* Overview of debt: manageable
- Technical debt is low
1. News flow improved
## Recommendation
* Technical analysis supports entry
- Buy on dips
2. Overview: hold for now";

        let report = parse_report(text, &specs());
        assert_eq!(
            body(&report, SectionKind::FinancialHealth),
            "* News of strong iPhone sales lifted margins\n\
             * Overview of debt: manageable\n\
             - Technical debt is low\n\
             1. News flow improved"
        );
        assert_eq!(
            body(&report, SectionKind::Recommendation),
            "* Technical analysis supports entry\n- Buy on dips\n2. Overview: hold for now"
        );
        assert_eq!(body(&report, SectionKind::BusinessOverview), "");
        assert_eq!(body(&report, SectionKind::TechnicalAnalysis), "");
        assert_eq!(body(&report, SectionKind::NewsSummary), "");
    }

    #[test]
    fn test_numbered_header_must_match_alias_exactly() {
        let text = "1. Business Overview\nMakes phones.\n2) Financial Health:\nNet cash.";
        let report = parse_report(text, &specs());
        assert_eq!(body(&report, SectionKind::BusinessOverview), "Makes phones.");
        assert_eq!(body(&report, SectionKind::FinancialHealth), "Net cash.");
    }

    #[test]
    fn test_repeated_header_appends() {
        let text = "## Financial Health\nfirst\n## Technical Analysis\nta\n## Financial Health\nsecond";
        let report = parse_report(text, &specs());
        assert_eq!(body(&report, SectionKind::FinancialHealth), "first\nsecond");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(2.95e12), "$2.95T");
        assert_eq!(format_amount(383.285e9), "$383.29B");
        assert_eq!(format_amount(-12.5e6), "-$12.50M");
        assert_eq!(format_amount(950.0), "$950.00");
    }

    // -- composer ------------------------------------------------------------

    struct FakeLlm {
        reply: Result<String, ()>,
        last_prompt: Mutex<Option<(String, String)>>,
    }

    #[async_trait]
    impl LlmProvider for FakeLlm {
        async fn generate_completion(&self, system: &str, prompt: String) -> Result<String, LlmError> {
            *self.last_prompt.lock().unwrap() = Some((system.to_string(), prompt));
            self.reply
                .clone()
                .map_err(|_| LlmError::ApiError("HTTP 401 Unauthorized".to_string()))
        }

        fn model(&self) -> &str {
            "fake"
        }
    }

    fn snapshot() -> MarketSnapshot {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = (0..3)
            .map(|i| PriceBar {
                date: start + chrono::Duration::days(i),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0 + i as f64,
                volume: 10,
            })
            .collect();

        let mut income = FinancialStatement::empty(StatementKind::Income);
        income.insert(NaiveDate::from_ymd_opt(2023, 9, 30).unwrap(), "TotalRevenue", 383.285e9);

        MarketSnapshot {
            ticker: Ticker::parse("AAPL").unwrap(),
            currency: Some("USD".to_string()),
            profile: Some(CompanyProfile {
                sector: Some("Technology".to_string()),
                trailing_pe: Some(29.5),
                ..Default::default()
            }),
            prices: PriceSeries::new(bars),
            income,
            balance_sheet: FinancialStatement::empty(StatementKind::BalanceSheet),
            moving_averages: MovingAverages { ma50: Some(190.0), ma200: Some(180.0), ..Default::default() },
        }
    }

    fn news() -> Vec<NewsItem> {
        vec![NewsItem {
            source: "Reuters".to_string(),
            headline: "Apple unveils new chips".to_string(),
            url: "https://example.com/chips".to_string(),
            published_at: None,
            body_snippet: String::new(),
        }]
    }

    #[test]
    fn test_prompt_embeds_retrieved_context_and_section_instructions() {
        let composer = ReportComposer::new(Arc::new(LlmService::new(&Default::default())), ReportConfig::default());
        let market = snapshot();
        let news = news();
        let prompt = composer.build_prompt(&ReportInput { company_name: "Apple Inc.", market: &market, news: &news });

        assert!(prompt.contains("Company: Apple Inc. (AAPL)"));
        assert!(prompt.contains("- Sector: Technology"));
        assert!(prompt.contains("- P/E Ratio: 29.50"));
        assert!(prompt.contains("- Revenue: $383.29B"));
        assert!(prompt.contains("## Balance Sheet\n- Not available"));
        assert!(prompt.contains("- Current Price: $102.00"));
        assert!(prompt.contains("- 50-day MA: $190.00"));
        assert!(prompt.contains("- Trend: Bullish"));
        assert!(prompt.contains("- Apple unveils new chips (Reuters)"));
        for kind in SectionKind::ALL {
            assert!(prompt.contains(&format!("## {}", kind.title())));
        }
    }

    #[tokio::test]
    async fn test_compose_parses_model_output() {
        let fake = Arc::new(FakeLlm { reply: Ok(FULL.to_string()), last_prompt: Mutex::new(None) });
        let composer = ReportComposer::new(Arc::new(LlmService::with_provider(fake.clone())), ReportConfig::default());
        let market = snapshot();
        let news = news();

        let report = composer
            .compose(&ReportInput { company_name: "Apple Inc.", market: &market, news: &news })
            .await
            .unwrap();

        assert_eq!(report.populated_count(), 5);
        let (system, prompt) = fake.last_prompt.lock().unwrap().clone().unwrap();
        assert_eq!(system, SYSTEM_INSTRUCTION);
        assert!(prompt.contains("AAPL"));
    }

    #[tokio::test]
    async fn test_compose_surfaces_api_failure() {
        let fake = Arc::new(FakeLlm { reply: Err(()), last_prompt: Mutex::new(None) });
        let composer = ReportComposer::new(Arc::new(LlmService::with_provider(fake)), ReportConfig::default());
        let market = snapshot();

        let err = composer
            .compose(&ReportInput { company_name: "Apple", market: &market, news: &[] })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::GenerationFailed(msg) if msg.contains("401")));
    }

    #[tokio::test]
    async fn test_compose_without_key_fails() {
        let composer = ReportComposer::new(Arc::new(LlmService::new(&Default::default())), ReportConfig::default());
        let market = snapshot();

        let err = composer
            .compose(&ReportInput { company_name: "Apple", market: &market, news: &[] })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::GenerationFailed(msg) if msg == "LLM API key not configured"));
    }
}
