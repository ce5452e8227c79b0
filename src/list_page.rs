//! Stock list page. The location's query string decides what is displayed;
//! this controller only reacts to it and writes back the canonical form.

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::api_client::DashboardApi;
use crate::location::Navigator;
use crate::parser::{format_date, parse_date, parse_query, ListQuery, Tab};
use crate::state::{ListLoad, SortKey, StockListState};

pub struct StockListPage<A: DashboardApi, N: Navigator> {
    api: A,
    nav: N,
    limit: u32,
    pub state: StockListState,
}

impl<A: DashboardApi, N: Navigator> StockListPage<A, N> {
    pub fn new(api: A, nav: N, limit: u32) -> Self {
        Self {
            api,
            nav,
            limit,
            state: StockListState::default(),
        }
    }

    pub fn navigator(&self) -> &N {
        &self.nav
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }

    fn query(&self) -> ListQuery {
        parse_query(&self.nav.search())
    }

    /// Load whatever the current location asks for.
    pub async fn sync(&mut self) {
        let query = self.query();
        self.state.tab = query.tab_or_default();

        let ticket = self.state.begin_load();
        let outcome = match query.date {
            Some(date) => {
                self.state.date = Some(date);
                self.fetch_by_date(date).await
            }
            None => self.fetch_latest().await,
        };
        if self.state.finish_load(ticket, outcome) {
            self.write_canonical(&query);
        }
    }

    async fn fetch_latest(&self) -> Result<ListLoad, String> {
        match self.api.latest_day(self.limit).await {
            Ok(resp) => {
                let date = resp
                    .latest_date_retrieved
                    .as_deref()
                    .and_then(|d| parse_date(d).or_else(|| d.get(..10).and_then(parse_date)));
                match (resp.data, date) {
                    (Some(stocks), Some(date)) => {
                        info!("Loaded {} stocks for latest day {}", stocks.len(), date);
                        Ok(ListLoad {
                            stocks,
                            date: Some(date),
                        })
                    }
                    _ => Err("No data found for the latest day.".to_string()),
                }
            }
            Err(e) => {
                error!("fetch latest day failed: {:#}", e);
                Err(e.to_string())
            }
        }
    }

    async fn fetch_by_date(&self, date: NaiveDate) -> Result<ListLoad, String> {
        match self.api.stocks_by_date(date, self.limit).await {
            Ok(resp) => match resp.data {
                Some(stocks) => {
                    info!("Loaded {} stocks for {}", stocks.len(), date);
                    Ok(ListLoad {
                        stocks,
                        date: Some(date),
                    })
                }
                None => Err(format!("No data found for {}.", format_date(date))),
            },
            Err(e) => {
                error!("fetch stocks for {} failed: {:#}", date, e);
                Err(e.to_string())
            }
        }
    }

    /// Rewrite the location to `date=<displayed>&tab=<tab>` once a date is known.
    fn write_canonical(&mut self, query: &ListQuery) {
        let Some(date) = self.state.date else {
            return;
        };
        let target = query.canonical(date).to_query_string();
        if target != self.nav.search() {
            self.nav.replace(&target);
        }
    }

    /// Failure leaves every date selectable.
    pub async fn load_available_dates(&mut self) {
        match self.api.available_dates().await {
            Ok(resp) => self.state.set_available_dates(resp.dates),
            Err(e) => warn!("fetch available dates failed: {:#}", e),
        }
    }

    /// Replaces the current history entry, then reloads from it.
    pub async fn change_date(&mut self, date: NaiveDate) {
        let mut query = self.query();
        query.date = Some(date);
        self.nav.replace(&query.to_query_string());
        self.sync().await;
    }

    pub fn change_tab(&mut self, tab: Tab) {
        let mut query = self.query();
        query.tab = Some(tab);
        self.nav.replace(&query.to_query_string());
        self.state.tab = tab;
    }

    /// Reorders the displayed rows only.
    pub fn set_sort(&mut self, key: SortKey) {
        self.state.sort = key;
    }

    pub async fn retry(&mut self) {
        self.sync().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::MemoryHistory;
    use crate::state::Phase;
    use crate::testing::{FakeApi, Reply};
    use serde_json::json;

    fn rows(symbols: &[&str]) -> serde_json::Value {
        json!(symbols
            .iter()
            .map(|s| json!({"symbol": s, "today_date": "2024-05-03"}))
            .collect::<Vec<_>>())
    }

    fn page(api: FakeApi, search: &str) -> StockListPage<FakeApi, MemoryHistory> {
        StockListPage::new(api, MemoryHistory::new("/", search), 500)
    }

    fn day(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    // ---------- initial load ----------

    #[tokio::test]
    async fn no_date_resolves_latest_and_rewrites_location() {
        let api = FakeApi::new().with(
            "latest_day",
            Reply::Json(json!({"data": rows(&["AAA", "BBB"]), "latest_date_retrieved": "2024-05-03"})),
        );
        let mut p = page(api, "");
        p.sync().await;

        assert_eq!(p.api().calls(), vec!["latest_day 500"]);
        assert_eq!(p.state.phase, Phase::Loaded);
        assert_eq!(p.state.stocks.len(), 2);
        assert_eq!(p.state.date, Some(day("2024-05-03")));
        assert_eq!(p.navigator().href(), "/?date=2024-05-03&tab=0");
        assert_eq!(p.navigator().entries().len(), 1);
    }

    #[tokio::test]
    async fn existing_tab_is_preserved_on_rewrite() {
        let api = FakeApi::new().with(
            "latest_day",
            Reply::Json(json!({"data": [], "latest_date_retrieved": "2024-05-03"})),
        );
        let mut p = page(api, "?tab=1");
        p.sync().await;
        assert_eq!(p.navigator().search(), "date=2024-05-03&tab=1");
        assert_eq!(p.state.tab, Tab::Strategy);
    }

    #[tokio::test]
    async fn valid_date_fetches_that_day() {
        let api = FakeApi::new().with("by_date", Reply::Json(json!({"data": rows(&["AAA"])})));
        let mut p = page(api, "date=2024-05-01&tab=0");
        p.sync().await;
        assert_eq!(p.api().calls(), vec!["by_date 2024-05-01 500"]);
        assert_eq!(p.navigator().search(), "date=2024-05-01&tab=0");
    }

    #[tokio::test]
    async fn invalid_date_and_tab_are_normalised() {
        let api = FakeApi::new().with(
            "latest_day",
            Reply::Json(json!({"data": [], "latest_date_retrieved": "2024-05-03"})),
        );
        let mut p = page(api, "date=2024-13-01&tab=9");
        p.sync().await;
        assert_eq!(p.api().calls(), vec!["latest_day 500"]);
        assert_eq!(p.navigator().search(), "date=2024-05-03&tab=0");
    }

    // ---------- failures ----------

    #[tokio::test]
    async fn latest_without_data_is_an_error() {
        let api = FakeApi::new().with("latest_day", Reply::Json(json!({})));
        let mut p = page(api, "");
        p.sync().await;
        assert_eq!(p.state.phase.error(), Some("No data found for the latest day."));
        assert!(p.state.stocks.is_empty());
        assert_eq!(p.navigator().search(), "");
    }

    #[tokio::test]
    async fn date_without_data_still_gets_tab() {
        let api = FakeApi::new().with("by_date", Reply::Json(json!({"data": null})));
        let mut p = page(api, "date=2024-05-01");
        p.sync().await;
        assert_eq!(p.state.phase.error(), Some("No data found for 2024-05-01."));
        assert_eq!(p.navigator().search(), "date=2024-05-01&tab=0");
    }

    #[tokio::test]
    async fn http_failure_then_retry() {
        let api = FakeApi::new().with("by_date", Reply::Status(500, "boom".into()));
        let mut p = page(api, "date=2024-05-01&tab=0");
        p.sync().await;
        assert_eq!(p.state.phase.error(), Some("HTTP error! status: 500"));

        p.api().set("by_date", Reply::Json(json!({"data": rows(&["AAA"])})));
        p.retry().await;
        assert_eq!(p.state.phase, Phase::Loaded);
        assert_eq!(p.state.stocks.len(), 1);
    }

    #[tokio::test]
    async fn available_dates_failure_is_silent() {
        let api = FakeApi::new().with("available_dates", Reply::Transport("offline".into()));
        let mut p = page(api, "");
        p.load_available_dates().await;
        assert!(p.state.is_date_selectable(day("1999-01-01")));
        assert_eq!(p.state.phase, Phase::Idle);

        p.api()
            .set("available_dates", Reply::Json(json!({"dates": ["2024-05-01"]})));
        p.load_available_dates().await;
        assert!(!p.state.is_date_selectable(day("1999-01-01")));
    }

    // ---------- interactions ----------

    #[tokio::test]
    async fn changing_date_replaces_history_and_reloads() {
        let api = FakeApi::new().with("by_date", Reply::Json(json!({"data": rows(&["AAA"])})));
        let mut p = page(api, "date=2024-05-01&tab=1&ref=x");
        p.change_date(day("2024-05-02")).await;
        assert_eq!(p.navigator().entries().len(), 1);
        assert_eq!(p.navigator().search(), "date=2024-05-02&tab=1&ref=x");
        assert_eq!(p.api().calls(), vec!["by_date 2024-05-02 500"]);
    }

    #[tokio::test]
    async fn tab_and_sort_do_not_refetch() {
        let api = FakeApi::new().with("by_date", Reply::Json(json!({"data": rows(&["B", "A"])})));
        let mut p = page(api, "date=2024-05-01&tab=0");
        p.sync().await;
        p.api().clear_calls();

        p.change_tab(Tab::Strategy);
        p.set_sort(SortKey::Symbol);
        assert!(p.api().calls().is_empty());
        assert_eq!(p.navigator().search(), "date=2024-05-01&tab=1");
        let order: Vec<&str> = p.state.sorted().iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(order, vec!["A", "B"]);
    }
}
