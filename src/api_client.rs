//! HTTP access to the dashboard API.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::ApiCfg;
use crate::error::{DashboardError, Result};
use crate::parser::format_date;
use crate::types::{
    AddNewsRequest, ApiEnvelope, AvailableDates, ByDateResponse, DeleteNewsRequest,
    LatestDayResponse, StockDetail, StrategyCatalogue, StrategyDetailData,
};

/// Remote calls the pages depend on, one per endpoint.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// GET /api/stocks/available_dates
    async fn available_dates(&self) -> Result<AvailableDates>;

    /// GET /api/stocks/latest_day?limit=N
    async fn latest_day(&self, limit: u32) -> Result<LatestDayResponse>;

    /// GET /api/stocks/by_date?date=D&limit=N
    async fn stocks_by_date(&self, date: NaiveDate, limit: u32) -> Result<ByDateResponse>;

    /// GET /stocks/{symbol}
    async fn stock_detail(&self, symbol: &str) -> Result<StockDetail>;

    /// POST /api/stocks/{symbol}/add-news
    async fn add_news(&self, symbol: &str, body: &AddNewsRequest) -> Result<Value>;

    /// DELETE /api/stocks/{symbol}/news/{uuid}
    async fn delete_news(&self, symbol: &str, uuid: &str, body: &DeleteNewsRequest)
        -> Result<Value>;

    /// GET /api/strategies
    async fn strategies(&self) -> Result<ApiEnvelope<StrategyCatalogue>>;

    /// GET /api/strategy/{name}
    async fn strategy(&self, name: &str) -> Result<ApiEnvelope<StrategyDetailData>>;
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(cfg: &ApiCfg) -> anyhow::Result<Self> {
        let base = Url::parse(&cfg.base_url)?;
        let mut builder = Client::builder();
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(ua) = &cfg.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        Ok(Self {
            client: builder.build()?,
            base,
        })
    }

    /// Base URL plus percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DashboardError::Transport(format!("cannot use {} as a base URL", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute(&self, req: RequestBuilder) -> Result<String> {
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(DashboardError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);
        let body = self.execute(self.client.get(url)).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Mutation responses may be JSON or plain text.
fn loose_body(body: String) -> Value {
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}

#[async_trait]
impl DashboardApi for ApiClient {
    async fn available_dates(&self) -> Result<AvailableDates> {
        let url = self.endpoint(&["api", "stocks", "available_dates"])?;
        self.get_json(url).await
    }

    async fn latest_day(&self, limit: u32) -> Result<LatestDayResponse> {
        let mut url = self.endpoint(&["api", "stocks", "latest_day"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        self.get_json(url).await
    }

    async fn stocks_by_date(&self, date: NaiveDate, limit: u32) -> Result<ByDateResponse> {
        let mut url = self.endpoint(&["api", "stocks", "by_date"])?;
        url.query_pairs_mut()
            .append_pair("date", &format_date(date))
            .append_pair("limit", &limit.to_string());
        self.get_json(url).await
    }

    async fn stock_detail(&self, symbol: &str) -> Result<StockDetail> {
        let url = self.endpoint(&["stocks", symbol])?;
        self.get_json(url).await
    }

    async fn add_news(&self, symbol: &str, body: &AddNewsRequest) -> Result<Value> {
        let url = self.endpoint(&["api", "stocks", symbol, "add-news"])?;
        debug!("POST {}", url);
        let text = self.execute(self.client.post(url).json(body)).await?;
        Ok(loose_body(text))
    }

    async fn delete_news(
        &self,
        symbol: &str,
        uuid: &str,
        body: &DeleteNewsRequest,
    ) -> Result<Value> {
        let url = self.endpoint(&["api", "stocks", symbol, "news", uuid])?;
        debug!("DELETE {}", url);
        let text = self.execute(self.client.delete(url).json(body)).await?;
        Ok(loose_body(text))
    }

    async fn strategies(&self) -> Result<ApiEnvelope<StrategyCatalogue>> {
        let url = self.endpoint(&["api", "strategies"])?;
        self.get_json(url).await
    }

    async fn strategy(&self, name: &str) -> Result<ApiEnvelope<StrategyDetailData>> {
        let url = self.endpoint(&["api", "strategy", name])?;
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ApiCfg {
            base_url: base.to_string(),
            ..ApiCfg::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoints_join_and_encode_segments() {
        let c = client("https://fastapi.enomars.org/");
        assert_eq!(
            c.endpoint(&["api", "stocks", "BRK B", "news", "a/b"]).unwrap().as_str(),
            "https://fastapi.enomars.org/api/stocks/BRK%20B/news/a%2Fb"
        );
        let nested = client("http://localhost:8000/v2");
        assert_eq!(
            nested.endpoint(&["stocks", "AAPL"]).unwrap().as_str(),
            "http://localhost:8000/v2/stocks/AAPL"
        );
    }

    #[test]
    fn strategy_names_are_percent_encoded() {
        let c = client("https://fastapi.enomars.org/");
        assert_eq!(
            c.endpoint(&["api", "strategy", "開盤缺口"]).unwrap().as_str(),
            "https://fastapi.enomars.org/api/strategy/%E9%96%8B%E7%9B%A4%E7%BC%BA%E5%8F%A3"
        );
    }

    #[test]
    fn mutation_bodies_fall_back_to_text() {
        assert_eq!(loose_body(r#"{"message":"ok"}"#.into())["message"], "ok");
        assert_eq!(loose_body("deleted".into()), Value::String("deleted".into()));
        assert_eq!(loose_body(r#""gone""#.into()), Value::String("gone".into()));
    }
}
