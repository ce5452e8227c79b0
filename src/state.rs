//! Page state: load phases, status banners, request sequencing and the stock list.

use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;
use tracing::debug;

use crate::parser::{parse_date, Tab};
use crate::types::StockSummary;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error(String),
}

impl Phase {
    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        matches!(self, Phase::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Phase::Error(m) => Some(m),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub message: String,
    pub severity: Severity,
}

impl StatusMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Warning,
        }
    }
}

// ---------- Request sequencing ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// Hands out increasing tickets; only the most recent one may commit its response.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: u64,
}

impl RequestSequencer {
    pub fn issue(&mut self) -> RequestTicket {
        self.latest += 1;
        RequestTicket(self.latest)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.latest
    }
}

// ---------- Sorting ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    None,
    Symbol,
    Name,
    CloseChange,
    HighChange,
    DayClose,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::None => "",
            SortKey::Symbol => "symbol",
            SortKey::Name => "name",
            SortKey::CloseChange => "close_change_percentage",
            SortKey::HighChange => "high_change_percentage",
            SortKey::DayClose => "day_close",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::None => "None",
            SortKey::Symbol => "Symbol",
            SortKey::Name => "Name",
            SortKey::CloseChange => "% Change (Close)",
            SortKey::HighChange => "% Change (High)",
            SortKey::DayClose => "Close Price",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "none" => Ok(SortKey::None),
            "symbol" => Ok(SortKey::Symbol),
            "name" => Ok(SortKey::Name),
            "close_change_percentage" => Ok(SortKey::CloseChange),
            "high_change_percentage" => Ok(SortKey::HighChange),
            "day_close" => Ok(SortKey::DayClose),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// Missing values go last; present values use `cmp`.
fn nulls_last<T>(a: Option<T>, b: Option<T>, cmp: impl FnOnce(T, T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn text_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

pub fn compare(key: SortKey, a: &StockSummary, b: &StockSummary) -> Ordering {
    match key {
        SortKey::None => Ordering::Equal,
        SortKey::Symbol => text_order(&a.symbol, &b.symbol),
        SortKey::Name => nulls_last(
            a.name.as_deref().filter(|n| !n.is_empty()),
            b.name.as_deref().filter(|n| !n.is_empty()),
            text_order,
        ),
        SortKey::CloseChange => nulls_last(
            a.close_change_percentage,
            b.close_change_percentage,
            descending,
        ),
        SortKey::HighChange => nulls_last(
            a.high_change_percentage,
            b.high_change_percentage,
            descending,
        ),
        SortKey::DayClose => nulls_last(a.day_close, b.day_close, descending),
    }
}

// ---------- Stock list ----------

/// A finished list fetch: the rows and the date they belong to.
#[derive(Debug, Clone)]
pub struct ListLoad {
    pub stocks: Vec<StockSummary>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Default)]
pub struct StockListState {
    pub phase: Phase,
    pub stocks: Vec<StockSummary>,
    /// Date of the rows on display.
    pub date: Option<NaiveDate>,
    pub tab: Tab,
    pub sort: SortKey,
    available: BTreeSet<NaiveDate>,
    sequencer: RequestSequencer,
}

impl StockListState {
    pub fn begin_load(&mut self) -> RequestTicket {
        self.phase = Phase::Loading;
        self.sequencer.issue()
    }

    /// Commit a fetch outcome. Returns false when a newer load was started meanwhile.
    pub fn finish_load(
        &mut self,
        ticket: RequestTicket,
        outcome: std::result::Result<ListLoad, String>,
    ) -> bool {
        if !self.sequencer.is_current(ticket) {
            debug!("discarding stale list response {:?}", ticket);
            return false;
        }
        match outcome {
            Ok(load) => {
                self.stocks = load.stocks;
                if load.date.is_some() {
                    self.date = load.date;
                }
                self.phase = Phase::Loaded;
            }
            Err(message) => {
                self.stocks.clear();
                self.phase = Phase::Error(message);
            }
        }
        true
    }

    /// Unparseable entries are skipped.
    pub fn set_available_dates<I, S>(&mut self, dates: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.available = dates
            .into_iter()
            .filter_map(|d| parse_date(d.as_ref()))
            .collect();
    }

    pub fn available_dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.available.iter()
    }

    /// Every date is selectable until the set of known dates has been loaded.
    pub fn is_date_selectable(&self, date: NaiveDate) -> bool {
        self.available.is_empty() || self.available.contains(&date)
    }

    /// Rows in display order; the loaded list itself is never reordered.
    pub fn sorted(&self) -> Vec<&StockSummary> {
        let mut rows: Vec<&StockSummary> = self.stocks.iter().collect();
        if self.sort != SortKey::None {
            rows.sort_by(|a, b| compare(self.sort, a, b));
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stock(symbol: &str, name: Option<&str>, close_pct: Option<f64>) -> StockSummary {
        serde_json::from_value(json!({
            "symbol": symbol,
            "name": name,
            "close_change_percentage": close_pct,
            "today_date": "2024-05-01"
        }))
        .unwrap()
    }

    fn symbols(rows: &[&StockSummary]) -> Vec<String> {
        rows.iter().map(|s| s.symbol.clone()).collect()
    }

    fn loaded(stocks: Vec<StockSummary>) -> StockListState {
        let mut st = StockListState::default();
        let t = st.begin_load();
        st.finish_load(t, Ok(ListLoad { stocks, date: None }));
        st
    }

    // ---------- sort ----------

    #[test]
    fn numeric_keys_descend_with_nulls_last() {
        let mut st = loaded(vec![
            stock("A", None, Some(1.0)),
            stock("B", None, None),
            stock("C", None, Some(30.0)),
            stock("D", None, Some(-2.0)),
        ]);
        st.sort = SortKey::CloseChange;
        assert_eq!(symbols(&st.sorted()), vec!["C", "A", "D", "B"]);
    }

    #[test]
    fn text_keys_ascend_and_are_stable() {
        let mut st = loaded(vec![
            stock("b", Some("Zed"), None),
            stock("A", None, None),
            stock("c", Some("alpha"), None),
            stock("a2", Some("Alpha"), None),
        ]);
        st.sort = SortKey::Symbol;
        assert_eq!(symbols(&st.sorted()), vec!["A", "a2", "b", "c"]);

        st.sort = SortKey::Name;
        // "Alpha" < "alpha" on the raw tie-break; missing name last
        assert_eq!(symbols(&st.sorted()), vec!["a2", "c", "b", "A"]);
    }

    #[test]
    fn no_sort_keeps_server_order_and_list_untouched() {
        let mut st = loaded(vec![stock("Z", None, None), stock("A", None, None)]);
        assert_eq!(symbols(&st.sorted()), vec!["Z", "A"]);
        st.sort = SortKey::Symbol;
        let _ = st.sorted();
        assert_eq!(st.stocks[0].symbol, "Z");
    }

    #[test]
    fn sort_key_from_str() {
        assert_eq!("day_close".parse::<SortKey>(), Ok(SortKey::DayClose));
        assert_eq!("".parse::<SortKey>(), Ok(SortKey::None));
        assert!("price".parse::<SortKey>().is_err());
    }

    // ---------- load lifecycle ----------

    #[test]
    fn stale_response_is_discarded() {
        let mut st = StockListState::default();
        let first = st.begin_load();
        let second = st.begin_load();
        assert!(st.finish_load(
            second,
            Ok(ListLoad { stocks: vec![stock("NEW", None, None)], date: None })
        ));
        assert!(!st.finish_load(
            first,
            Ok(ListLoad { stocks: vec![stock("OLD", None, None)], date: None })
        ));
        assert_eq!(st.stocks[0].symbol, "NEW");
        assert_eq!(st.phase, Phase::Loaded);
    }

    #[test]
    fn failure_clears_rows_and_keeps_message() {
        let mut st = loaded(vec![stock("A", None, None)]);
        let t = st.begin_load();
        assert!(st.phase.is_loading());
        st.finish_load(t, Err("HTTP error! status: 500".into()));
        assert!(st.stocks.is_empty());
        assert_eq!(st.phase.error(), Some("HTTP error! status: 500"));
    }

    #[test]
    fn dates_selectable_until_known() {
        let mut st = StockListState::default();
        let d = parse_date("2024-05-01").unwrap();
        assert!(st.is_date_selectable(d));
        st.set_available_dates(["2024-05-02", "garbage"]);
        assert!(!st.is_date_selectable(d));
        assert!(st.is_date_selectable(parse_date("2024-05-02").unwrap()));
        assert_eq!(st.available_dates().count(), 1);
    }
}
