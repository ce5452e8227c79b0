//! Stock detail view model: one payload in, one fully-defaulted prop set per card out.

use serde_json::Value;

use crate::chart::{self, PriceLevelInputs, PriceLevels, Window};
use crate::types::{NewsItem, OhlcPoint, StockDetail};
use crate::utils::{display_value, format_percent, safe_field, safe_number, value_number};

const PRICE: &str = "0.00";
const ZERO: &str = "0";
const NA: &str = "N/A";

/// SEC analysis keys that are surfaced elsewhere or treated as noise.
const ANALYSIS_HIDDEN: [&str; 4] = ["Cash (USD)", "Debt (USD)", "CIK", "Data Date"];
const ANALYSIS_CASH: &str = "Cash (USD)";
const ANALYSIS_DEBT: &str = "Debt (USD)";

/// Scalar fields read off the detail payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    DayClose,
    CloseChangePercentage,
    DayLow,
    DayHigh,
    YesterdayClose,
    MarketOpenHigh,
    MarketOpenLow,
    Float,
    FloatRisk,
    OutstandingShares,
    CashAndEquivalents,
    TotalDebt,
    Sector,
    Industry,
    CountryDomicile,
    SecurityType,
    Isin,
    SecFiling,
    AnalysisSummary,
    AnalysisDetails,
    AnalysisRecommendation,
    Suggestion,
}

impl Field {
    /// (payload key, display default, empty text counts as missing)
    const fn entry(self) -> (&'static str, &'static str, bool) {
        match self {
            Field::DayClose => ("day_close", PRICE, false),
            Field::CloseChangePercentage => ("close_change_percentage", ZERO, false),
            Field::DayLow => ("day_low", PRICE, false),
            Field::DayHigh => ("day_high", PRICE, false),
            Field::YesterdayClose => ("yesterday_close", ZERO, false),
            Field::MarketOpenHigh => ("market_open_high", ZERO, false),
            Field::MarketOpenLow => ("market_open_low", ZERO, false),
            Field::Float => ("float", NA, false),
            Field::FloatRisk => ("float_risk", NA, false),
            Field::OutstandingShares => ("outstandingShares", NA, false),
            Field::CashAndEquivalents => ("cash_and_equivalents", ZERO, false),
            Field::TotalDebt => ("total_debt", ZERO, false),
            Field::Sector => ("sector", NA, false),
            Field::Industry => ("industry", NA, false),
            Field::CountryDomicile => ("countryDomicile", NA, false),
            Field::SecurityType => ("securityType", NA, false),
            Field::Isin => ("isin", NA, false),
            Field::SecFiling => ("sec_filing", "No SEC filing content available.", true),
            Field::AnalysisSummary => ("sec_filing_analysis_summary", "No summary available.", true),
            Field::AnalysisDetails => ("sec_filing_analysis_details", "No details available.", true),
            Field::AnalysisRecommendation => (
                "sec_filing_analysis_recommendation",
                "No recommendation available.",
                true,
            ),
            Field::Suggestion => ("suggestion", "No suggestion available.", true),
        }
    }

    pub fn default_text(self) -> &'static str {
        self.entry().1
    }
}

impl StockDetail {
    fn raw(&self, field: Field) -> Option<&Value> {
        let (key, _, blank_missing) = field.entry();
        self.fields.get(key).filter(|v| match v {
            Value::Null => false,
            Value::String(s) if blank_missing => !s.is_empty(),
            _ => true,
        })
    }

    /// Display text of `field`, or its default.
    pub fn text(&self, field: Field) -> String {
        self.raw(field)
            .map(display_value)
            .unwrap_or_else(|| field.default_text().to_string())
    }

    /// Non-null value from the SEC analysis mapping.
    pub fn analysis_value(&self, key: &str) -> Option<&Value> {
        static MISSING: Value = Value::Null;
        let v = safe_field(self.sec_filing_analysis.as_ref(), key, &MISSING);
        (!v.is_null()).then_some(v)
    }
}

// ---------- Cards ----------

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub title: String,
    pub as_of: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricTile {
    pub title: &'static str,
    pub value: String,
    pub trend: Option<Trend>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsCard {
    pub day_close: String,
    pub close_change_percentage: String,
    pub day_low: String,
    pub day_high: String,
    pub float: String,
    pub float_risk: String,
    pub market_cap: String,
}

impl MetricsCard {
    pub fn tiles(&self) -> Vec<MetricTile> {
        let change = safe_number(Some(&self.close_change_percentage), 0.0);
        let trend = if change >= 0.0 { Trend::Up } else { Trend::Down };
        let tile = |title, value: String| MetricTile {
            title,
            value,
            trend: None,
        };
        vec![
            tile("Day Close", format!("${}", self.day_close)),
            MetricTile {
                title: "Change %",
                value: format_percent(change),
                trend: Some(trend),
            },
            tile(
                "Day Range",
                format!("${} - ${}", self.day_low, self.day_high),
            ),
            tile("Market Cap", self.market_cap.clone()),
            tile("Float", self.float.clone()),
            tile("Float Risk", self.float_risk.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyInfoCard {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub industry: String,
    pub country_domicile: String,
    pub security_type: String,
    pub isin: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisValue {
    Text(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisEntry {
    pub key: String,
    pub value: AnalysisValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecFilingCard {
    pub filing: String,
    pub summary: String,
    pub details: String,
    pub recommendation: String,
    pub analysis: Vec<AnalysisEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionCard {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsCard {
    pub symbol: String,
    pub items: Vec<NewsItem>,
    pub document_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FigureSource {
    Analysis,
    Statement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CashDebtCard {
    pub cash: String,
    pub cash_source: FigureSource,
    pub debt: String,
    pub debt_source: FigureSource,
}

impl CashDebtCard {
    pub fn bars(&self) -> [(&'static str, f64); 2] {
        [
            ("Cash", safe_number(Some(&self.cash), 0.0)),
            ("Debt", safe_number(Some(&self.debt), 0.0)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceChartCard {
    pub symbol: String,
    pub day_low: String,
    pub yesterday_close: String,
    pub day_close: String,
    pub day_high: String,
    pub market_open_high: String,
    pub market_open_low: String,
    pub key_levels: Vec<f64>,
}

impl PriceChartCard {
    pub fn levels(&self) -> PriceLevels {
        PriceLevels::from_inputs(&PriceLevelInputs {
            yesterday_close: &self.yesterday_close,
            day_low: &self.day_low,
            day_high: &self.day_high,
            day_close: &self.day_close,
            market_open_high: &self.market_open_high,
            market_open_low: &self.market_open_low,
            key_levels: &self.key_levels,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandleChart {
    pub title: &'static str,
    pub points: Vec<OhlcPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockDetailView {
    pub header: Header,
    pub metrics: MetricsCard,
    pub company: CompanyInfoCard,
    pub sec_filing: SecFilingCard,
    pub suggestion: SuggestionCard,
    pub news: NewsCard,
    pub cash_debt: CashDebtCard,
    pub price: PriceChartCard,
    pub daily: CandleChart,
    pub one_minute: CandleChart,
    pub five_minute: CandleChart,
}

// ---------- Assembly ----------

/// `$<cap in millions>M` when both inputs parse and the product is non-zero, else `N/A`.
pub fn market_cap(outstanding_shares: Option<&Value>, day_close: Option<&Value>) -> String {
    let shares = outstanding_shares.and_then(value_number);
    let close = day_close.and_then(value_number);
    match (shares, close) {
        (Some(s), Some(c)) if s * c != 0.0 => format!("${:.2}M", s * c / 1e6),
        _ => NA.to_string(),
    }
}

fn analysis_entries(detail: &StockDetail) -> Vec<AnalysisEntry> {
    let Some(map) = detail.sec_filing_analysis.as_ref() else {
        return Vec::new();
    };
    map.iter()
        .filter(|(key, _)| !ANALYSIS_HIDDEN.iter().any(|h| h.eq_ignore_ascii_case(key)))
        .map(|(key, value)| AnalysisEntry {
            key: key.clone(),
            value: match value {
                Value::Array(items) => AnalysisValue::List(
                    items
                        .iter()
                        .map(|it| match it {
                            Value::Null => NA.to_string(),
                            other => display_value(other),
                        })
                        .collect(),
                ),
                Value::Null => AnalysisValue::Text(NA.to_string()),
                other => AnalysisValue::Text(display_value(other)),
            },
        })
        .collect()
}

/// Analysis-derived figure when present, else the top-level statement field.
fn cash_or_debt(detail: &StockDetail, analysis_key: &str, field: Field) -> (String, FigureSource) {
    match detail.analysis_value(analysis_key) {
        Some(v) => (display_value(v), FigureSource::Analysis),
        None => (detail.text(field), FigureSource::Statement),
    }
}

pub fn assemble(detail: &StockDetail) -> StockDetailView {
    let symbol = detail.symbol.clone();
    let name = detail
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| NA.to_string());

    let header = Header {
        title: format!(
            "{} ({})",
            detail.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&symbol),
            symbol
        ),
        as_of: detail.today_date.clone().unwrap_or_default(),
    };

    let metrics = MetricsCard {
        day_close: detail.text(Field::DayClose),
        close_change_percentage: detail.text(Field::CloseChangePercentage),
        day_low: detail.text(Field::DayLow),
        day_high: detail.text(Field::DayHigh),
        float: detail.text(Field::Float),
        float_risk: detail.text(Field::FloatRisk),
        market_cap: market_cap(
            detail.raw(Field::OutstandingShares),
            detail.raw(Field::DayClose),
        ),
    };

    let company = CompanyInfoCard {
        symbol: symbol.clone(),
        name,
        sector: detail.text(Field::Sector),
        industry: detail.text(Field::Industry),
        country_domicile: detail.text(Field::CountryDomicile),
        security_type: detail.text(Field::SecurityType),
        isin: detail.text(Field::Isin),
    };

    let sec_filing = SecFilingCard {
        filing: detail.text(Field::SecFiling),
        summary: detail.text(Field::AnalysisSummary),
        details: detail.text(Field::AnalysisDetails),
        recommendation: detail.text(Field::AnalysisRecommendation),
        analysis: analysis_entries(detail),
    };

    let (cash, cash_source) = cash_or_debt(detail, ANALYSIS_CASH, Field::CashAndEquivalents);
    let (debt, debt_source) = cash_or_debt(detail, ANALYSIS_DEBT, Field::TotalDebt);

    let price = PriceChartCard {
        symbol: symbol.clone(),
        day_low: detail.text(Field::DayLow),
        yesterday_close: detail.text(Field::YesterdayClose),
        day_close: detail.text(Field::DayClose),
        day_high: detail.text(Field::DayHigh),
        market_open_high: detail.text(Field::MarketOpenHigh),
        market_open_low: detail.text(Field::MarketOpenLow),
        key_levels: detail.key_levels.clone(),
    };

    StockDetailView {
        header,
        metrics,
        company,
        sec_filing,
        suggestion: SuggestionCard {
            text: detail.text(Field::Suggestion),
        },
        news: NewsCard {
            symbol,
            items: detail.raw_news.clone(),
            document_id: detail.document_id().map(str::to_string),
        },
        cash_debt: CashDebtCard {
            cash,
            cash_source,
            debt,
            debt_source,
        },
        price,
        daily: CandleChart {
            title: Window::Daily.title(),
            points: chart::derive_daily(&detail.chart_1d),
        },
        one_minute: CandleChart {
            title: Window::OneMinute.title(),
            points: chart::derive_1min(&detail.chart_1m),
        },
        five_minute: CandleChart {
            title: Window::FiveMinute.title(),
            points: chart::derive_5min(&detail.chart_5m),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn detail(v: Value) -> StockDetail {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn market_cap_formats_millions() {
        assert_eq!(market_cap(Some(&json!("1000000")), Some(&json!("10"))), "$10.00M");
        assert_eq!(market_cap(None, Some(&json!("10"))), "N/A");
        assert_eq!(market_cap(Some(&json!("abc")), Some(&json!(10))), "N/A");
        assert_eq!(market_cap(Some(&json!("0")), Some(&json!(10))), "N/A");
        assert_eq!(market_cap(Some(&json!("2,500,000")), Some(&json!(2))), "$5.00M");
    }

    #[test]
    fn missing_fields_get_card_defaults() {
        let view = assemble(&detail(json!({"_id": {"$oid": "x"}, "symbol": "ABC"})));
        assert_eq!(view.metrics.day_close, "0.00");
        assert_eq!(view.metrics.close_change_percentage, "0");
        assert_eq!(view.metrics.float, "N/A");
        assert_eq!(view.metrics.market_cap, "N/A");
        assert_eq!(view.company.name, "N/A");
        assert_eq!(view.company.industry, "N/A");
        assert_eq!(view.sec_filing.filing, "No SEC filing content available.");
        assert_eq!(view.suggestion.text, "No suggestion available.");
        assert_eq!(view.cash_debt.cash, "0");
        assert_eq!(view.price.yesterday_close, "0");
        assert_eq!(view.header.title, "ABC (ABC)");
        assert!(view.daily.points.is_empty());
    }

    #[test]
    fn blank_text_counts_as_missing_but_zero_number_does_not() {
        let view = assemble(&detail(json!({
            "symbol": "ABC", "suggestion": "", "day_close": 0, "float": null
        })));
        assert_eq!(view.suggestion.text, "No suggestion available.");
        assert_eq!(view.metrics.day_close, "0");
        assert_eq!(view.metrics.float, "N/A");
    }

    #[test]
    fn metrics_tiles_render_values() {
        let view = assemble(&detail(json!({
            "symbol": "ABC", "name": "Abc Corp", "day_close": "2.5",
            "close_change_percentage": "-3.456", "day_low": 2.1, "day_high": 2.9,
            "outstandingShares": 4000000
        })));
        let tiles = view.metrics.tiles();
        assert_eq!(tiles[0].value, "$2.5");
        assert_eq!(tiles[1].value, "-3.46%");
        assert_eq!(tiles[1].trend, Some(Trend::Down));
        assert_eq!(tiles[2].value, "$2.1 - $2.9");
        assert_eq!(tiles[3].value, "$10.00M");
        assert_eq!(view.header.title, "Abc Corp (ABC)");
    }

    #[test]
    fn analysis_grid_hides_surfaced_keys_but_cash_feeds_chart() {
        let view = assemble(&detail(json!({
            "symbol": "ABC",
            "cash_and_equivalents": "100",
            "total_debt": 50,
            "sec_filing_analysis": {
                "CIK": "0001234",
                "data date": "2024-04-30",
                "Cash (USD)": "2,000,000",
                "Debt (USD)": null,
                "ATM Risk Level": "High",
                "Recommendation Reasons": ["dilution", null],
                "Short Squeeze Risk": null
            }
        })));
        let keys: Vec<&str> = view.sec_filing.analysis.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["ATM Risk Level", "Recommendation Reasons", "Short Squeeze Risk"]);
        assert_eq!(
            view.sec_filing.analysis[1].value,
            AnalysisValue::List(vec!["dilution".into(), "N/A".into()])
        );
        assert_eq!(view.sec_filing.analysis[2].value, AnalysisValue::Text("N/A".into()));

        assert_eq!(view.cash_debt.cash, "2,000,000");
        assert_eq!(view.cash_debt.cash_source, FigureSource::Analysis);
        // null analysis debt falls back to the statement figure
        assert_eq!(view.cash_debt.debt, "50");
        assert_eq!(view.cash_debt.debt_source, FigureSource::Statement);
        assert_eq!(view.cash_debt.bars(), [("Cash", 2_000_000.0), ("Debt", 50.0)]);
    }

    #[test]
    fn news_card_uses_document_id_not_news_fields() {
        let view = assemble(&detail(json!({
            "_id": {"$oid": "doc-1"},
            "symbol": "ABC",
            "raw_news": [{"uuid": "n-1", "summary": "s", "timestamp": "t", "target_document_id": "other"}]
        })));
        assert_eq!(view.news.document_id.as_deref(), Some("doc-1"));
        assert_eq!(view.news.items.len(), 1);
    }

    #[test]
    fn charts_are_windowed() {
        let view = assemble(&detail(json!({
            "symbol": "ABC",
            "1m_chart_data": [
                {"datetime": {"$date": "2024-05-01T10:00:00Z"}, "open": 1, "high": 1, "low": 1, "close": 1},
                {"datetime": {"$date": "2024-05-01T15:00:00Z"}, "open": 2, "high": 2, "low": 2, "close": 2}
            ],
            "1d_chart_data": [
                {"datetime": {"$date": "2024-05-02T00:00:00Z"}, "open": 2, "high": 2, "low": 2, "close": 2},
                {"datetime": {"$date": "2024-05-01T00:00:00Z"}, "open": 1, "high": 1, "low": 1, "close": 1}
            ]
        })));
        assert_eq!(view.one_minute.points.len(), 1);
        assert_eq!(view.one_minute.title, "1-Min (Last 2 Hrs)");
        assert_eq!(view.daily.points[0].close, 1.0);
        assert!(view.five_minute.points.is_empty());
    }
}
