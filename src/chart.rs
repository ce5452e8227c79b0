//! Chart data derivation: windowed candle series and price-level overlays.

use chrono::{DateTime, Duration, Utc};

use crate::types::{OhlcPoint, RawCandle};
use crate::utils::safe_number;

/// Lookback of the 1-minute chart, measured back from its latest candle.
pub const ONE_MINUTE_LOOKBACK_HOURS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    OneMinute,
    FiveMinute,
    Daily,
}

impl Window {
    pub fn title(self) -> &'static str {
        match self {
            Window::OneMinute => "1-Min (Last 2 Hrs)",
            Window::FiveMinute => "5-Min (Last Day)",
            Window::Daily => "Daily",
        }
    }
}

/// Time-ordered candles restricted to `window`. Records without a timestamp or with a missing
/// price are dropped; an empty input gives an empty series.
pub fn derive(raw: &[RawCandle], window: Window) -> Vec<OhlcPoint> {
    let points = sorted_points(raw);
    let Some(latest) = points.last().map(|p| p.time) else {
        return points;
    };
    match window {
        Window::OneMinute => {
            let cutoff = latest - Duration::hours(ONE_MINUTE_LOOKBACK_HOURS);
            points.into_iter().filter(|p| p.time >= cutoff).collect()
        }
        Window::FiveMinute => {
            let day = latest.date_naive();
            points.into_iter().filter(|p| p.time.date_naive() == day).collect()
        }
        Window::Daily => points,
    }
}

pub fn derive_1min(raw: &[RawCandle]) -> Vec<OhlcPoint> {
    derive(raw, Window::OneMinute)
}

pub fn derive_5min(raw: &[RawCandle]) -> Vec<OhlcPoint> {
    derive(raw, Window::FiveMinute)
}

pub fn derive_daily(raw: &[RawCandle]) -> Vec<OhlcPoint> {
    derive(raw, Window::Daily)
}

fn sorted_points(raw: &[RawCandle]) -> Vec<OhlcPoint> {
    let mut out: Vec<OhlcPoint> = raw
        .iter()
        .filter_map(|c| {
            Some(OhlcPoint {
                time: c.datetime?,
                open: c.open?,
                high: c.high?,
                low: c.low?,
                close: c.close?,
            })
        })
        .collect();
    // stable: equal timestamps keep server order
    out.sort_by_key(|p| p.time);
    out
}

/// Summary of a derived series for compact display.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleStats {
    pub count: usize,
    pub first: DateTime<Utc>,
    pub last: DateTime<Utc>,
    pub low: f64,
    pub high: f64,
    pub last_close: f64,
}

impl CandleStats {
    pub fn of(points: &[OhlcPoint]) -> Option<Self> {
        let first = points.first()?;
        let last = points.last()?;
        let low = points.iter().map(|p| p.low).fold(f64::INFINITY, f64::min);
        let high = points.iter().map(|p| p.high).fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            count: points.len(),
            first: first.time,
            last: last.time,
            low,
            high,
            last_close: last.close,
        })
    }
}

/// Price-level chart inputs, already coerced to display strings by the view model.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceLevelInputs<'a> {
    pub yesterday_close: &'a str,
    pub day_low: &'a str,
    pub day_high: &'a str,
    pub day_close: &'a str,
    pub market_open_high: &'a str,
    pub market_open_low: &'a str,
    pub key_levels: &'a [f64],
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceLevels {
    pub yesterday_close: f64,
    pub day_low: f64,
    pub day_high: f64,
    pub day_close: f64,
    pub market_open_high: f64,
    pub market_open_low: f64,
    pub key_levels: Vec<f64>,
}

impl PriceLevels {
    pub fn from_inputs(i: &PriceLevelInputs<'_>) -> Self {
        Self {
            yesterday_close: safe_number(Some(i.yesterday_close), 0.0),
            day_low: safe_number(Some(i.day_low), 0.0),
            day_high: safe_number(Some(i.day_high), 0.0),
            day_close: safe_number(Some(i.day_close), 0.0),
            market_open_high: safe_number(Some(i.market_open_high), 0.0),
            market_open_low: safe_number(Some(i.market_open_low), 0.0),
            key_levels: i.key_levels.to_vec(),
        }
    }

    /// The price path drawn left to right.
    pub fn movement(&self) -> [(&'static str, f64); 4] {
        [
            ("Yesterday Close", self.yesterday_close),
            ("Day Low", self.day_low),
            ("Day High", self.day_high),
            ("Day Close", self.day_close),
        ]
    }

    /// Y axis bounds: 5% padding around the movement points and key levels.
    pub fn y_range(&self) -> (f64, f64) {
        let values = self
            .movement()
            .into_iter()
            .map(|(_, v)| v)
            .chain(self.key_levels.iter().copied());
        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        (min * 0.95, max * 1.05)
    }
}
