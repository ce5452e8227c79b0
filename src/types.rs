//! Wire payloads: stock list and detail, news, raw candles, strategies.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::utils::{display_value, value_number};

/// Server-assigned document id. Arrives as `{"$oid": "..."}` or a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Extended {
        #[serde(rename = "$oid")]
        oid: String,
    },
    Plain(String),
}

impl DocumentId {
    pub fn as_str(&self) -> &str {
        match self {
            DocumentId::Extended { oid } => oid,
            DocumentId::Plain(s) => s,
        }
    }
}

/// One row of the stock list.
#[derive(Debug, Clone, Deserialize)]
pub struct StockSummary {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de::number")]
    pub day_close: Option<f64>,
    #[serde(default, deserialize_with = "de::number")]
    pub yesterday_close: Option<f64>,
    #[serde(default, deserialize_with = "de::number")]
    pub close_change_percentage: Option<f64>,
    #[serde(default, deserialize_with = "de::number")]
    pub high_change_percentage: Option<f64>,
    #[serde(default, deserialize_with = "de::number")]
    pub day_high: Option<f64>,
    #[serde(default, deserialize_with = "de::number")]
    pub day_low: Option<f64>,
    #[serde(default, deserialize_with = "de::string")]
    pub today_date: String,
    #[serde(default, deserialize_with = "de::text")]
    pub float_risk: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default, deserialize_with = "de::flag")]
    pub short_signal: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NewsItem {
    #[serde(default, deserialize_with = "de::string")]
    pub uuid: String,
    #[serde(default, deserialize_with = "de::string")]
    pub summary: String,
    #[serde(default, deserialize_with = "de::string")]
    pub timestamp: String,
}

/// Raw time-series record as stored server side.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct RawCandle {
    pub datetime: Option<DateTime<Utc>>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
}

const TIME_KEYS: [&str; 3] = ["datetime", "observedAt", "time"];

impl From<Map<String, Value>> for RawCandle {
    /// The first time key that parses wins; other keys on the record are ignored.
    fn from(obj: Map<String, Value>) -> Self {
        let number = |key: &str| obj.get(key).and_then(value_number);
        Self {
            datetime: TIME_KEYS
                .iter()
                .filter_map(|k| obj.get(*k))
                .find_map(parse_timestamp),
            open: number("open"),
            high: number("high"),
            low: number("low"),
            close: number("close"),
        }
    }
}

/// Derived, time-ordered candle. Only produced by `chart::derive`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OhlcPoint {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Full detail payload for one symbol.
///
/// Structural fields are typed; the open-ended scalar fields (prices, float, company info, SEC
/// texts, ...) stay in `fields` in server order and are read through `detail::Field`.
#[derive(Debug, Clone, Deserialize)]
pub struct StockDetail {
    #[serde(rename = "_id", default)]
    pub id: Option<DocumentId>,
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub today_date: Option<String>,
    #[serde(default, deserialize_with = "de::numbers")]
    pub key_levels: Vec<f64>,
    #[serde(default)]
    pub sec_filing_analysis: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "de::nullable_vec")]
    pub raw_news: Vec<NewsItem>,
    #[serde(rename = "1m_chart_data", default, deserialize_with = "de::records")]
    pub chart_1m: Vec<RawCandle>,
    #[serde(rename = "5m_chart_data", default, deserialize_with = "de::records")]
    pub chart_5m: Vec<RawCandle>,
    #[serde(rename = "1d_chart_data", default, deserialize_with = "de::records")]
    pub chart_1d: Vec<RawCandle>,
    #[serde(default)]
    pub target_document_id: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl StockDetail {
    /// Correlation key for news mutations: the document's own id, else an explicit
    /// `target_document_id` field. Never taken from the news array.
    pub fn document_id(&self) -> Option<&str> {
        self.id
            .as_ref()
            .map(DocumentId::as_str)
            .or(self.target_document_id.as_deref())
            .filter(|s| !s.is_empty())
    }
}

// ---------- List responses ----------

#[derive(Debug, Default, Deserialize)]
pub struct AvailableDates {
    #[serde(default, deserialize_with = "de::nullable_vec")]
    pub dates: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LatestDayResponse {
    #[serde(default)]
    pub data: Option<Vec<StockSummary>>,
    #[serde(default)]
    pub latest_date_retrieved: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ByDateResponse {
    #[serde(default)]
    pub data: Option<Vec<StockSummary>>,
}

// ---------- Mutations ----------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddNewsRequest {
    pub password: String,
    pub news: String,
    pub target_document_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteNewsRequest {
    pub password: String,
    pub target_document_id: String,
}

// ---------- Strategies ----------

#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StrategyInfo {
    #[serde(rename = "名稱")]
    pub name: String,
    #[serde(rename = "說明", default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StrategyCatalogue {
    #[serde(default, deserialize_with = "de::nullable_vec")]
    pub long_strategies: Vec<StrategyInfo>,
    #[serde(default, deserialize_with = "de::nullable_vec")]
    pub short_strategies: Vec<StrategyInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StrategyDetail {
    #[serde(rename = "名稱")]
    pub name: String,
    #[serde(rename = "說明", default)]
    pub description: String,
    #[serde(rename = "簡介", default)]
    pub intro: Option<String>,
    #[serde(rename = "大機會出現時間", default)]
    pub best_window: Option<String>,
    #[serde(rename = "為什麼會出現", default)]
    pub rationale: Option<String>,
    #[serde(rename = "心理原因", default)]
    pub psychology: Option<String>,
    #[serde(rename = "圖表型態", default)]
    pub chart_pattern: Option<String>,
    #[serde(rename = "參數說明", default)]
    pub parameters: Option<String>,
    #[serde(rename = "止損設定", default)]
    pub stop_loss: Option<String>,
    #[serde(rename = "理想風險報酬比", default)]
    pub risk_reward: Option<String>,
    #[serde(rename = "不應進場條件", default)]
    pub avoid_when: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StrategyImage {
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub format: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StrategyDetailData {
    #[serde(default)]
    pub strategy: Option<StrategyDetail>,
    #[serde(default)]
    pub image: Option<StrategyImage>,
}

/// Timestamp of a raw record: extended JSON `{"$date": ...}`, ISO-8601 text, or epoch millis.
/// Naive text is read as UTC.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Object(obj) => obj
            .get("$date")
            .or_else(|| obj.get("$numberLong"))
            .and_then(parse_timestamp),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(naive.and_utc());
                }
            }
            if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return day.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
            }
            s.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)
        }
        _ => None,
    }
}

/// Lenient field deserializers shared by the payload types.
mod de {
    use super::*;

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let v = Option::<Value>::deserialize(d)?;
        Ok(v.as_ref().and_then(value_number))
    }

    pub fn numbers<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
        let v = Option::<Vec<Value>>::deserialize(d)?;
        Ok(v.unwrap_or_default().iter().filter_map(value_number).collect())
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let v = Option::<Value>::deserialize(d)?;
        Ok(v.filter(|v| !v.is_null()).map(|v| display_value(&v)))
    }

    /// Like `text`, but null or absent becomes the empty string.
    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(text(d)?.unwrap_or_default())
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        let v = Option::<Value>::deserialize(d)?;
        Ok(match v {
            Some(Value::Bool(b)) => b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            _ => false,
        })
    }

    pub fn nullable_vec<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
    }

    /// Array of records where an entry that does not decode is skipped.
    pub fn records<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let items = Option::<Vec<Value>>::deserialize(d)?.unwrap_or_default();
        Ok(items
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect())
    }
}
