//! News mutations: the add form and the password-gated delete dialog.
//! Neither flow edits the page locally; a success asks the caller to refetch.

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::api_client::DashboardApi;
use crate::error::{detail_message, DashboardError, Result};
use crate::state::StatusMessage;
use crate::types::{AddNewsRequest, DeleteNewsRequest};

const ADD_OK: &str = "News successfully added!";
const ADD_FAILED: &str = "Failed to add news.";
const ADD_UNEXPECTED: &str = "An unexpected error occurred. Please try again.";
const DELETE_OK: &str = "News deleted successfully!";
const DELETE_FAILED: &str = "Failed to delete news.";
pub const DELETE_NO_STOCK: &str = "Error: Missing stock data for deletion.";
const DELETE_NO_DOCUMENT: &str =
    "Document ID is missing. Cannot delete news. Please try refreshing the page.";

/// Server message for a failed mutation: its `detail`, else `fallback`.
/// `None` when the body could not be read at all.
fn failure_message(err: &DashboardError, fallback: &str) -> Option<String> {
    match err {
        DashboardError::Status { body, .. } => {
            let parsed: Value = serde_json::from_str(body).ok()?;
            Some(detail_message(&parsed).unwrap_or_else(|| fallback.to_string()))
        }
        _ => None,
    }
}

// ---------- Add ----------

#[derive(Debug, Clone, Default)]
pub struct NewsForm {
    pub password: String,
    pub text: String,
    pub warning: Option<String>,
    pub success: Option<String>,
}

impl NewsForm {
    pub fn new(password: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    /// Client-side checks, in the order the user sees them. Never touches the network.
    pub fn validate(&self, document_id: Option<&str>) -> Result<AddNewsRequest> {
        let no_password = self.password.trim().is_empty();
        let no_text = self.text.trim().is_empty();
        let msg = if no_password && no_text {
            "Please enter password and news article."
        } else if no_password {
            "Password is required."
        } else if no_text {
            "News article text is required."
        } else {
            match document_id.filter(|d| !d.is_empty()) {
                Some(id) => {
                    return Ok(AddNewsRequest {
                        password: self.password.clone(),
                        news: self.text.clone(),
                        target_document_id: id.to_string(),
                    })
                }
                None => "Document ID is missing. Cannot submit news. Please try refreshing the page.",
            }
        };
        Err(DashboardError::Validation(msg.to_string()))
    }

    /// Returns true when the news was stored and the page should refetch.
    pub async fn submit<A: DashboardApi + ?Sized>(
        &mut self,
        api: &A,
        symbol: &str,
        document_id: Option<&str>,
    ) -> bool {
        self.warning = None;
        self.success = None;
        let body = match self.validate(document_id) {
            Ok(b) => b,
            Err(e) => {
                self.warning = Some(e.to_string());
                return false;
            }
        };

        match api.add_news(symbol, &body).await {
            Ok(result) => {
                let msg = result
                    .get("message")
                    .and_then(|m| m.as_str())
                    .filter(|m| !m.is_empty())
                    .unwrap_or(ADD_OK);
                info!("News added for {}", symbol);
                self.success = Some(msg.to_string());
                self.text.clear();
                true
            }
            Err(e) => {
                error!("add news failed: {:#}", e);
                self.warning = Some(
                    failure_message(&e, ADD_FAILED).unwrap_or_else(|| ADD_UNEXPECTED.to_string()),
                );
                false
            }
        }
    }
}

// ---------- Delete ----------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub uuid: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteCommand {
    pub uuid: String,
    pub body: DeleteNewsRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Confirm {
    /// Password empty or nothing selected; the button is inert.
    Disabled,
    MissingDocument(StatusMessage),
    Ready(DeleteCommand),
}

#[derive(Debug, Clone, Default)]
pub struct DeleteDialog {
    target: Option<PendingDelete>,
    pub password: String,
}

impl DeleteDialog {
    pub fn open(&mut self, uuid: &str, summary: &str) {
        self.target = Some(PendingDelete {
            uuid: uuid.to_string(),
            summary: summary.to_string(),
        });
        self.password.clear();
    }

    pub fn cancel(&mut self) {
        self.target = None;
        self.password.clear();
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    #[cfg(test)]
    pub fn target(&self) -> Option<&PendingDelete> {
        self.target.as_ref()
    }

    pub fn can_confirm(&self) -> bool {
        self.is_open() && !self.password.trim().is_empty()
    }

    /// Closes the dialog unless the button is disabled.
    pub fn confirm(&mut self, document_id: Option<&str>) -> Confirm {
        if !self.can_confirm() {
            return Confirm::Disabled;
        }
        let Some(target) = self.target.take() else {
            return Confirm::Disabled;
        };
        debug!("confirming delete of {} ({:?})", target.uuid, target.summary);
        let password = std::mem::take(&mut self.password);
        match document_id.filter(|d| !d.is_empty()) {
            Some(id) => Confirm::Ready(DeleteCommand {
                uuid: target.uuid,
                body: DeleteNewsRequest {
                    password,
                    target_document_id: id.to_string(),
                },
            }),
            None => {
                warn!("delete requested without a document id");
                Confirm::MissingDocument(StatusMessage::error(DELETE_NO_DOCUMENT))
            }
        }
    }
}

/// Issue a delete and describe the outcome. A success banner means the page should refetch.
pub async fn delete_news<A: DashboardApi + ?Sized>(
    api: &A,
    symbol: Option<&str>,
    cmd: &DeleteCommand,
) -> StatusMessage {
    let Some(symbol) = symbol.filter(|s| !s.is_empty()) else {
        return StatusMessage::error(DELETE_NO_STOCK);
    };
    match api.delete_news(symbol, &cmd.uuid, &cmd.body).await {
        Ok(result) => {
            info!("News {} deleted for {}", cmd.uuid, symbol);
            match result {
                Value::String(s) => StatusMessage::success(s),
                _ => StatusMessage::success(DELETE_OK),
            }
        }
        Err(e) => {
            error!("delete news failed: {:#}", e);
            StatusMessage::error(failure_message(&e, DELETE_FAILED).unwrap_or_else(|| e.to_string()))
        }
    }
}
