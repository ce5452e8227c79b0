//! Error taxonomy for API calls and form validation.
//!
//! Every failure is caught at the call site and turned into a message for the page; nothing here
//! is fatal to the process.

use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Error, Debug)]
pub enum DashboardError {
    /// Network or transport failure before a response arrived.
    #[error("{0}")]
    Transport(String),

    /// Non-2xx response. The body is kept for `detail_message` and excerpts.
    #[error("HTTP error! status: {status}")]
    Status { status: u16, body: String },

    /// Response arrived but did not have the expected JSON shape.
    #[error("{0}")]
    Shape(String),

    /// Client-side validation; never reaches the network.
    #[error("{0}")]
    Validation(String),
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        DashboardError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Shape(err.to_string())
    }
}

impl DashboardError {
    /// First `limit` characters of a failure body.
    pub fn excerpt(&self, limit: usize) -> Option<String> {
        match self {
            DashboardError::Status { body, .. } if !body.is_empty() => {
                Some(body.chars().take(limit).collect())
            }
            _ => None,
        }
    }
}

/// Read the FastAPI-style `detail` field: a validation array (first `msg`), a plain string, or an
/// object carrying `msg`/`message`.
pub fn detail_message(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::Array(items) => items
            .first()
            .and_then(|it| it.get("msg"))
            .and_then(|m| m.as_str())
            .map(str::to_string),
        Value::String(s) => Some(s.clone()),
        obj @ Value::Object(_) => obj
            .get("msg")
            .or_else(|| obj.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .or_else(|| Some(obj.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_renders_like_fetch_error() {
        let err = DashboardError::Status {
            status: 503,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "HTTP error! status: 503");
    }

    #[test]
    fn detail_from_validation_array() {
        let body = json!({"detail": [{"loc": ["body", "news"], "msg": "field required"}]});
        assert_eq!(detail_message(&body).as_deref(), Some("field required"));
    }

    #[test]
    fn detail_from_string_and_object() {
        assert_eq!(
            detail_message(&json!({"detail": "Invalid password"})).as_deref(),
            Some("Invalid password")
        );
        assert_eq!(
            detail_message(&json!({"detail": {"message": "gone"}})).as_deref(),
            Some("gone")
        );
        assert_eq!(
            detail_message(&json!({"detail": {"code": 7}})).as_deref(),
            Some(r#"{"code":7}"#)
        );
        assert_eq!(detail_message(&json!({"error": "x"})), None);
    }

    #[test]
    fn excerpt_cuts_status_body() {
        let err = DashboardError::Status {
            status: 500,
            body: "<html>oops</html>".into(),
        };
        assert_eq!(err.excerpt(6).as_deref(), Some("<html>"));
        assert_eq!(DashboardError::Transport("offline".into()).excerpt(6), None);
    }

    #[test]
    fn json_error_is_shape() {
        let json_err = serde_json::from_str::<i32>("invalid").unwrap_err();
        let err: DashboardError = json_err.into();
        assert!(matches!(err, DashboardError::Shape(_)));
    }
}
