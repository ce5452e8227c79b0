//! Parse and serialise the list page query string (`date=YYYY-MM-DD&tab=0|1`).
//! Unrelated parameters are carried through untouched.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;
use url::form_urlencoded;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Stocks = 0,
    Strategy = 1,
}

impl Tab {
    /// Only the literal indices `0` and `1` are accepted.
    pub fn from_param(raw: &str) -> Option<Tab> {
        match raw.trim() {
            "0" => Some(Tab::Stocks),
            "1" => Some(Tab::Strategy),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::Stocks => "Stocks",
            Tab::Strategy => "Strategy",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub date: Option<NaiveDate>,
    pub tab: Option<Tab>,
    /// Every other parameter, in the order given.
    pub extra: Vec<(String, String)>,
}

fn date_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date pattern"))
}

/// Strict `YYYY-MM-DD` that also names a real calendar day.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let t = raw.trim();
    if !date_shape().is_match(t) {
        return None;
    }
    NaiveDate::parse_from_str(t, DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Invalid `date`/`tab` values are dropped, as if absent.
pub fn parse_query(search: &str) -> ListQuery {
    let s = search.strip_prefix('?').unwrap_or(search);
    let mut q = ListQuery::default();
    for (k, v) in form_urlencoded::parse(s.as_bytes()) {
        match k.as_ref() {
            "date" => q.date = parse_date(&v),
            "tab" => q.tab = Tab::from_param(&v),
            _ => q.extra.push((k.into_owned(), v.into_owned())),
        }
    }
    q
}

impl ListQuery {
    pub fn tab_or_default(&self) -> Tab {
        self.tab.unwrap_or_default()
    }

    /// `date` first, then `tab`, then the carried parameters. No leading `?`.
    pub fn to_query_string(&self) -> String {
        let mut ser = form_urlencoded::Serializer::new(String::new());
        if let Some(d) = self.date {
            ser.append_pair("date", &format_date(d));
        }
        if let Some(t) = self.tab {
            ser.append_pair("tab", &t.index().to_string());
        }
        for (k, v) in &self.extra {
            ser.append_pair(k, v);
        }
        ser.finish()
    }

    /// Canonical form once the displayed date is known: the resolved date and an explicit tab.
    pub fn canonical(&self, resolved: NaiveDate) -> ListQuery {
        ListQuery {
            date: Some(resolved),
            tab: Some(self.tab_or_default()),
            extra: self.extra.clone(),
        }
    }
}
