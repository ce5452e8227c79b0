//! Trading strategy catalogue and detail pages.

use regex::Regex;
use std::sync::OnceLock;
use tracing::{error, info};

use crate::api_client::DashboardApi;
use crate::error::DashboardError;
use crate::state::Phase;
use crate::types::{StrategyDetail, StrategyImage, StrategyInfo};

/// Where "back" leads from a strategy page: the list page on its strategy tab.
pub const BACK_ROUTE: &str = "/?tab=1";
const IMAGE_DIR: &str = "/assets/strategies";
pub const PLACEHOLDER_IMAGE: &str = "/assets/strategies/strategy_none.png";
const SUCCESS: &str = "success";
const ERROR_BODY_LIMIT: usize = 200;

// ---------- Routes and images ----------

pub fn detail_route(name: &str) -> String {
    format!("/strategy/{}", urlencoding::encode(name))
}

/// Inverse of `detail_route`. Returns None for any other path.
pub fn name_from_route(path: &str) -> Option<String> {
    let raw = path.strip_prefix("/strategy/")?;
    let name = urlencoding::decode(raw).ok()?.into_owned();
    (!name.is_empty()).then_some(name)
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[^A-Za-z0-9_\x{4e00}-\x{9fff}]").expect("valid filename pattern")
    })
}

/// Image file stem for a strategy name: whitespace runs become `_`, anything outside
/// ASCII word characters and CJK ideographs is dropped, then lower-cased.
pub fn friendly_filename(name: &str) -> String {
    let underscored = whitespace_run().replace_all(name.trim(), "_");
    unsafe_chars()
        .replace_all(&underscored, "")
        .to_lowercase()
}

/// Image paths to try in order; the last one is the placeholder.
pub fn image_candidates(name: &str) -> Vec<String> {
    let friendly = friendly_filename(name);
    vec![
        format!("{IMAGE_DIR}/{friendly}.png"),
        format!("{IMAGE_DIR}/{friendly}.jpg"),
        format!("{IMAGE_DIR}/{friendly}.jpeg"),
        format!("{IMAGE_DIR}/{}.png", urlencoding::encode(name)),
        format!("{IMAGE_DIR}/{}.png", whitespace_run().replace_all(name, "_")),
        PLACEHOLDER_IMAGE.to_string(),
    ]
}

#[derive(Debug, Clone, Default)]
pub struct ImageChain {
    paths: Vec<String>,
    index: usize,
}

impl ImageChain {
    pub fn new(name: &str) -> Self {
        Self {
            paths: image_candidates(name),
            index: 0,
        }
    }

    pub fn current(&self) -> &str {
        self.paths
            .get(self.index)
            .map(String::as_str)
            .unwrap_or(PLACEHOLDER_IMAGE)
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.paths.len()
    }

    /// Walk the chain until `exists` accepts a path; the placeholder is always accepted.
    pub fn resolve(&mut self, exists: impl Fn(&str) -> bool) -> &str {
        while !exists(self.current()) && self.next_image() {}
        self.current()
    }

    /// Advance after a load failure. Returns false once the placeholder is reached.
    pub fn next_image(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        true
    }
}

// ---------- Detail sections ----------

impl StrategyDetail {
    /// Narrative sections in display order, titled by their native key. Empty ones are skipped.
    pub fn sections(&self) -> Vec<(&'static str, &str)> {
        [
            ("說明", Some(self.description.as_str())),
            ("簡介", self.intro.as_deref()),
            ("大機會出現時間", self.best_window.as_deref()),
            ("為什麼會出現", self.rationale.as_deref()),
            ("心理原因", self.psychology.as_deref()),
            ("圖表型態", self.chart_pattern.as_deref()),
            ("參數說明", self.parameters.as_deref()),
            ("止損設定", self.stop_loss.as_deref()),
            ("理想風險報酬比", self.risk_reward.as_deref()),
            ("不應進場條件", self.avoid_when.as_deref()),
        ]
        .into_iter()
        .filter_map(|(title, body)| body.filter(|b| !b.is_empty()).map(|b| (title, b)))
        .collect()
    }
}

// ---------- Catalogue page ----------

#[derive(Debug, Default)]
pub struct Catalogue {
    pub short: Vec<StrategyInfo>,
    pub long: Vec<StrategyInfo>,
}

impl Catalogue {
    pub fn is_empty(&self) -> bool {
        self.short.is_empty() && self.long.is_empty()
    }
}

pub struct StrategyListPage<A: DashboardApi> {
    api: A,
    pub phase: Phase,
    pub catalogue: Catalogue,
}

impl<A: DashboardApi> StrategyListPage<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            phase: Phase::Idle,
            catalogue: Catalogue::default(),
        }
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn load(&mut self) {
        self.phase = Phase::Loading;
        let outcome = match self.api.strategies().await {
            Ok(env) => match env.data {
                Some(data) if env.status == SUCCESS => Ok(Catalogue {
                    short: data.short_strategies,
                    long: data.long_strategies,
                }),
                _ => Err("API returned success false or data is missing.".to_string()),
            },
            Err(e @ DashboardError::Status { .. }) => Err(format!(
                "{} - {}",
                e,
                e.excerpt(ERROR_BODY_LIMIT).unwrap_or_default()
            )),
            Err(e) => Err(e.to_string()),
        };
        match outcome {
            Ok(catalogue) => {
                info!(
                    "Loaded {} short / {} long strategies",
                    catalogue.short.len(),
                    catalogue.long.len()
                );
                self.catalogue = catalogue;
                self.phase = Phase::Loaded;
            }
            Err(message) => {
                error!("fetch strategies failed: {}", message);
                self.catalogue = Catalogue::default();
                self.phase = Phase::Error(message);
            }
        }
    }
}

// ---------- Detail page ----------

const PARSE_FAILED: &str = "Failed to parse strategy details from API response.";

pub struct StrategyDetailPage<A: DashboardApi> {
    api: A,
    name: String,
    pub phase: Phase,
    strategy: Option<StrategyDetail>,
    /// Image embedded in the response, if the server sent one.
    pub image: Option<StrategyImage>,
    pub images: ImageChain,
}

impl<A: DashboardApi> StrategyDetailPage<A> {
    pub fn new(api: A, name: &str) -> Self {
        Self {
            api,
            name: name.trim().to_string(),
            phase: Phase::Idle,
            strategy: None,
            image: None,
            images: ImageChain::default(),
        }
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn strategy(&self) -> Option<&StrategyDetail> {
        self.strategy.as_ref()
    }

    pub fn back_route(&self) -> &'static str {
        BACK_ROUTE
    }

    pub async fn load(&mut self) {
        if self.name.is_empty() {
            self.phase = Phase::Error("Strategy name is missing from URL.".to_string());
            return;
        }
        self.phase = Phase::Loading;
        let outcome = match self.api.strategy(&self.name).await {
            Ok(env) => match env.data.and_then(|d| d.strategy.map(|s| (s, d.image))) {
                Some(found) if env.status == SUCCESS => Ok(found),
                _ => Err(PARSE_FAILED.to_string()),
            },
            Err(DashboardError::Status { status: 404, .. }) => Err("Strategy not found.".to_string()),
            Err(DashboardError::Shape(detail)) => {
                error!("strategy payload did not decode: {}", detail);
                Err(PARSE_FAILED.to_string())
            }
            Err(e) => Err(e.to_string()),
        };
        match outcome {
            Ok((strategy, image)) => {
                info!("Loaded strategy {}", strategy.name);
                self.images = ImageChain::new(&strategy.name);
                self.strategy = Some(strategy);
                self.image = image;
                self.phase = Phase::Loaded;
            }
            Err(message) => {
                error!("fetch strategy {} failed: {}", self.name, message);
                self.strategy = None;
                self.image = None;
                self.phase = Phase::Error(message);
            }
        }
    }
}
