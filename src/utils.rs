//! Small helpers: lenient number parsing and display formatting.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

pub fn sanitize_symbol(sym: &str) -> String {
    sym.trim().to_uppercase()
}

fn leading_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid number pattern")
    })
}

/// Read the longest leading decimal number, ignoring thousands separators.
/// "1,234.5" -> 1234.5, "12.5%" -> 12.5, "abc" -> None.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    let m = leading_number().find(&cleaned)?;
    m.as_str().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Numeric value of a JSON number or numeric string.
pub fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

pub fn safe_number(value: Option<&str>, default: f64) -> f64 {
    value.and_then(parse_number).unwrap_or(default)
}

/// `object[key]` unless the object is missing or the field is null/absent.
pub fn safe_field<'a>(
    object: Option<&'a Map<String, Value>>,
    key: &str,
    default: &'a Value,
) -> &'a Value {
    object
        .and_then(|o| o.get(key))
        .filter(|v| !v.is_null())
        .unwrap_or(default)
}

/// Render a JSON value the way the dashboard prints raw fields.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string()),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|it| match it {
                Value::Null => String::new(),
                other => display_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// B/M/K suffix for large magnitudes, fixed decimals otherwise.
pub fn format_magnitude(num: f64, decimals: usize) -> String {
    let abs = num.abs();
    if abs >= 1e9 {
        format!("{:.*}B", decimals, num / 1e9)
    } else if abs >= 1e6 {
        format!("{:.*}M", decimals, num / 1e6)
    } else if abs >= 1e3 {
        format!("{:.*}K", decimals, num / 1e3)
    } else {
        format!("{:.*}", decimals, num)
    }
}

pub fn format_percent(num: f64) -> String {
    format!("{num:.2}%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn safe_number_cases() {
        assert_eq!(safe_number(Some("1,234.5"), 0.0), 1234.5);
        assert_eq!(safe_number(None, 7.0), 7.0);
        assert_eq!(safe_number(Some("abc"), 3.0), 3.0);
        assert_eq!(safe_number(Some(""), 2.0), 2.0);
        assert_eq!(safe_number(Some("  -0.5 "), 0.0), -0.5);
    }

    #[test]
    fn parse_number_reads_prefix() {
        assert_eq!(parse_number("12.5%"), Some(12.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number(".25"), Some(0.25));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("-"), None);
    }

    #[test]
    fn value_number_accepts_strings_and_numbers() {
        assert_eq!(value_number(&json!(3)), Some(3.0));
        assert_eq!(value_number(&json!("2,000")), Some(2000.0));
        assert_eq!(value_number(&json!(null)), None);
        assert_eq!(value_number(&json!([1])), None);
    }

    #[test]
    fn safe_field_skips_null_and_missing() {
        let fallback = json!("N/A");
        let obj = json!({"a": 1, "b": null});
        let map = obj.as_object();
        assert_eq!(safe_field(map, "a", &fallback), &json!(1));
        assert_eq!(safe_field(map, "b", &fallback), &fallback);
        assert_eq!(safe_field(map, "c", &fallback), &fallback);
        assert_eq!(safe_field(None, "a", &fallback), &fallback);
    }

    #[test]
    fn magnitude_suffixes() {
        assert_eq!(format_magnitude(1_500_000.0, 2), "1.50M");
        assert_eq!(format_magnitude(-2500.0, 2), "-2.50K");
        assert_eq!(format_magnitude(42.0, 2), "42.00");
        assert_eq!(format_magnitude(3_200_000_000.0, 1), "3.2B");
        assert_eq!(format_magnitude(999.0, 0), "999");
    }

    #[test]
    fn display_matches_plain_printing() {
        assert_eq!(display_value(&json!(10.0)), "10");
        assert_eq!(display_value(&json!(1.25)), "1.25");
        assert_eq!(display_value(&json!(7)), "7");
        assert_eq!(display_value(&json!("High")), "High");
        assert_eq!(display_value(&json!(["a", null, 2])), "a,,2");
        assert_eq!(display_value(&json!(true)), "true");
    }

    #[test]
    fn symbol_is_trimmed_and_upper() {
        assert_eq!(sanitize_symbol("  aapl "), "AAPL");
        assert_eq!(format_percent(-3.456), "-3.46%");
    }
}
