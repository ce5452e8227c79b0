//! Stock detail page: owns one fetched payload, the news form and the delete dialog.

use tracing::{error, info, warn};

use crate::api_client::DashboardApi;
use crate::detail::{assemble, StockDetailView};
use crate::news::{self, Confirm, DeleteDialog, NewsForm};
use crate::state::{Phase, RequestSequencer, Severity, StatusMessage};
use crate::types::StockDetail;
use crate::utils::sanitize_symbol;

pub struct StockDetailPage<A: DashboardApi> {
    api: A,
    symbol: String,
    pub phase: Phase,
    detail: Option<StockDetail>,
    /// Banner for delete outcomes.
    pub status: Option<StatusMessage>,
    pub form: NewsForm,
    pub dialog: DeleteDialog,
    sequencer: RequestSequencer,
}

impl<A: DashboardApi> StockDetailPage<A> {
    pub fn new(api: A, route_symbol: &str) -> Self {
        Self {
            api,
            symbol: sanitize_symbol(route_symbol),
            phase: Phase::Idle,
            detail: None,
            status: None,
            form: NewsForm::default(),
            dialog: DeleteDialog::default(),
            sequencer: RequestSequencer::default(),
        }
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn detail(&self) -> Option<&StockDetail> {
        self.detail.as_ref()
    }

    pub fn document_id(&self) -> Option<&str> {
        self.detail.as_ref().and_then(StockDetail::document_id)
    }

    /// Cards for the loaded payload. None while loading or after a failure.
    pub fn view(&self) -> Option<StockDetailView> {
        match self.phase {
            Phase::Loaded => self.detail.as_ref().map(assemble),
            _ => None,
        }
    }

    pub async fn load(&mut self) {
        if self.symbol.is_empty() {
            return;
        }
        self.phase = Phase::Loading;
        let ticket = self.sequencer.issue();
        let result = self.api.stock_detail(&self.symbol).await;
        if !self.sequencer.is_current(ticket) {
            return;
        }
        match result {
            Ok(detail) => {
                if detail.document_id().is_none() {
                    warn!(
                        "{} payload has no document id; news changes are disabled",
                        detail.symbol
                    );
                }
                info!("Loaded detail for {}", detail.symbol);
                self.detail = Some(detail);
                self.phase = Phase::Loaded;
            }
            Err(e) => {
                error!("fetch detail for {} failed: {:#}", self.symbol, e);
                self.phase = Phase::Error(e.to_string());
            }
        }
    }

    /// Submit `self.form`; a stored article reloads the page.
    pub async fn submit_news(&mut self) -> bool {
        let symbol = self
            .detail
            .as_ref()
            .map(|d| d.symbol.clone())
            .unwrap_or_else(|| self.symbol.clone());
        let doc = self.document_id().map(str::to_string);
        let stored = self.form.submit(&self.api, &symbol, doc.as_deref()).await;
        if stored {
            self.load().await;
        }
        stored
    }

    /// Confirm the open delete dialog; a successful delete reloads the page.
    pub async fn delete_news(&mut self) -> bool {
        if self.detail.is_none() {
            self.dialog.cancel();
            self.status = Some(StatusMessage::error(news::DELETE_NO_STOCK));
            return false;
        }
        let doc = self.document_id().map(str::to_string);
        match self.dialog.confirm(doc.as_deref()) {
            Confirm::Disabled => false,
            Confirm::MissingDocument(msg) => {
                self.status = Some(msg);
                false
            }
            Confirm::Ready(cmd) => {
                self.status = None;
                let symbol = self.detail.as_ref().map(|d| d.symbol.clone());
                let msg = news::delete_news(&self.api, symbol.as_deref(), &cmd).await;
                let deleted = msg.severity == Severity::Success;
                self.status = Some(msg);
                if deleted {
                    self.load().await;
                }
                deleted
            }
        }
    }
}
