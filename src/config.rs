//! Load and validate runtime configuration.

use anyhow::{bail, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs};
use tracing::info;
use url::Url;

use crate::state::SortKey;

pub const BASE_URL_ENV: &str = "SCANNER_API_BASE_URL";
pub const NEWS_PASSWORD_ENV: &str = "SCANNER_NEWS_PASSWORD";
const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiCfg {
    pub base_url: String,
    /// Row cap sent with list requests.
    pub list_limit: u32,
    pub timeout_secs: Option<u64>, // none = transport default
    pub user_agent: Option<String>,
}

impl Default for ApiCfg {
    fn default() -> Self {
        Self {
            base_url: "https://fastapi.enomars.org/".to_string(),
            list_limit: 500,
            timeout_secs: None,
            user_agent: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayCfg {
    pub default_sort: Option<String>, // e.g. "close_change_percentage"
    /// Trailing candles printed per chart.
    pub chart_tail: usize,
    /// Local copy of the site root; strategy images are looked up under it.
    pub assets_dir: Option<PathBuf>,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            default_sort: None,
            chart_tail: 5,
            assets_dir: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiCfg,
    pub display: DisplayCfg,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_yaml_str(&s).with_context(|| format!("parse {}", path.display()))
    }

    pub fn from_yaml_str(s: &str) -> anyhow::Result<Self> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Self = serde_yaml::from_str(s)?;
        Ok(cfg)
    }

    /// `--config` path, else ./config.yaml, else the platform config dir, else defaults.
    /// Environment overrides are applied last.
    pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = match explicit {
            Some(p) => Self::load(p)?,
            None => match candidate_paths().into_iter().find(|p| p.is_file()) {
                Some(p) => {
                    info!("Using config {}", p.display());
                    Self::load(&p)?
                }
                None => Self::default(),
            },
        };
        cfg.apply_overrides(env::var(BASE_URL_ENV).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_overrides(&mut self, base_url: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url.trim().to_string();
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.api.base_url)
            .with_context(|| format!("api.base_url is not a URL: {}", self.api.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("api.base_url must be http(s): {}", self.api.base_url);
        }
        if self.api.list_limit == 0 {
            bail!("api.list_limit must be > 0");
        }
        self.default_sort()?;
        Ok(())
    }

    pub fn default_sort(&self) -> anyhow::Result<SortKey> {
        match &self.display.default_sort {
            Some(s) => s.parse::<SortKey>().map_err(anyhow::Error::msg),
            None => Ok(SortKey::None),
        }
    }
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE)];
    if let Some(dirs) = ProjectDirs::from("org", "enomars", "wealthbehave-scanner") {
        paths.push(dirs.config_dir().join(CONFIG_FILE));
    }
    paths
}

/// Mutation password from the environment, if set.
pub fn news_password_from_env() -> Option<String> {
    env::var(NEWS_PASSWORD_ENV).ok().filter(|p| !p.is_empty())
}
