//! In-memory `DashboardApi` for controller tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::api_client::DashboardApi;
use crate::error::{DashboardError, Result};
use crate::parser::format_date;
use crate::types::{
    AddNewsRequest, ApiEnvelope, AvailableDates, ByDateResponse, DeleteNewsRequest,
    LatestDayResponse, StockDetail, StrategyCatalogue, StrategyDetailData,
};

#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Status(u16, String),
    Transport(String),
}

impl Reply {
    pub fn status_json(status: u16, body: Value) -> Self {
        Reply::Status(status, body.to_string())
    }

    fn into_result<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            Reply::Json(v) => Ok(serde_json::from_value(v)?),
            Reply::Status(status, body) => Err(DashboardError::Status { status, body }),
            Reply::Transport(m) => Err(DashboardError::Transport(m)),
        }
    }
}

/// Answers each endpoint with a fixed reply and records every call.
#[derive(Default)]
pub struct FakeApi {
    replies: Mutex<HashMap<&'static str, Reply>>,
    calls: Mutex<Vec<String>>,
    /// Sent bodies of news mutations, as JSON.
    pub bodies: Mutex<Vec<Value>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, endpoint: &'static str, reply: Reply) -> Self {
        self.set(endpoint, reply);
        self
    }

    pub fn set(&self, endpoint: &'static str, reply: Reply) {
        self.replies.lock().unwrap().insert(endpoint, reply);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn answer<T: DeserializeOwned>(&self, endpoint: &'static str, call: String) -> Result<T> {
        self.calls.lock().unwrap().push(call);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(endpoint)
            .cloned()
            .unwrap_or_else(|| Reply::status_json(404, json!({"detail": "Not Found"})));
        reply.into_result()
    }
}

#[async_trait]
impl DashboardApi for FakeApi {
    async fn available_dates(&self) -> Result<AvailableDates> {
        self.answer("available_dates", "available_dates".into())
    }

    async fn latest_day(&self, limit: u32) -> Result<LatestDayResponse> {
        self.answer("latest_day", format!("latest_day {limit}"))
    }

    async fn stocks_by_date(&self, date: NaiveDate, limit: u32) -> Result<ByDateResponse> {
        self.answer("by_date", format!("by_date {} {limit}", format_date(date)))
    }

    async fn stock_detail(&self, symbol: &str) -> Result<StockDetail> {
        self.answer("stock_detail", format!("stock_detail {symbol}"))
    }

    async fn add_news(&self, symbol: &str, body: &AddNewsRequest) -> Result<Value> {
        self.bodies.lock().unwrap().push(serde_json::to_value(body)?);
        self.answer("add_news", format!("add_news {symbol}"))
    }

    async fn delete_news(
        &self,
        symbol: &str,
        uuid: &str,
        body: &DeleteNewsRequest,
    ) -> Result<Value> {
        self.bodies.lock().unwrap().push(serde_json::to_value(body)?);
        self.answer("delete_news", format!("delete_news {symbol} {uuid}"))
    }

    async fn strategies(&self) -> Result<ApiEnvelope<StrategyCatalogue>> {
        self.answer("strategies", "strategies".into())
    }

    async fn strategy(&self, name: &str) -> Result<ApiEnvelope<StrategyDetailData>> {
        self.answer("strategy", format!("strategy {name}"))
    }
}
