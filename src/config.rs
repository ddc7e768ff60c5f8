//! # Config Module
//!
//! `~/.cc-guard.json` settings, layered as defaults, then file, then CLI flags.
//!
//! Every field is optional in the file; keys are camelCase:
//!
//! ```json
//! {
//!   "budgetPerBlock": 25,
//!   "warningThreshold": 70,
//!   "customPricing": {
//!     "glm": { "input": 1, "output": 2, "cacheWrite5m": 0, "cacheWrite1h": 0, "cacheRead": 0 }
//!   }
//! }
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::alert::AlertConfig;
use crate::cli::{Args, ModeArg};
use crate::discovery::default_logs_dir;
use crate::pricing::PricingOverrides;

pub const CONFIG_FILENAME: &str = ".cc-guard.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Api,
    Sub,
}

impl Mode {
    pub fn from_env() -> Self {
        match env::var("ANTHROPIC_API_KEY") {
            Ok(v) if !v.is_empty() => Mode::Api,
            _ => Mode::Sub,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Api => "api",
            Mode::Sub => "sub",
        }
    }
}

impl From<ModeArg> for Mode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Api => Mode::Api,
            ModeArg::Sub => Mode::Sub,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// USD per 5-hour block
    pub budget_per_block: f64,
    pub warning_threshold: f64,
    pub critical_threshold: f64,
    pub alerts_enabled: bool,
    pub log_dir: Option<PathBuf>,
    /// Milliseconds between re-reads of tracked files when no event arrives
    pub poll_interval: u64,
    pub mode: Mode,
    pub custom_pricing: PricingOverrides,
    pub token_budget_per_block: Option<f64>,
    /// Milliseconds between dashboard redraws
    pub refresh_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            budget_per_block: 50.0,
            warning_threshold: 80.0,
            critical_threshold: 95.0,
            alerts_enabled: true,
            log_dir: None,
            poll_interval: 1000,
            mode: Mode::from_env(),
            custom_pricing: PricingOverrides::new(),
            token_budget_per_block: None,
            refresh_interval: 1000,
        }
    }
}

impl Config {
    /// Apply command-line overrides on top of file/default values.
    pub fn merge_args(&mut self, args: &Args) {
        if let Some(b) = args.budget {
            self.budget_per_block = b;
        }
        if args.no_alert {
            self.alerts_enabled = false;
        }
        if let Some(ref dir) = args.log_dir {
            self.log_dir = Some(dir.clone());
        }
        if let Some(w) = args.warning {
            self.warning_threshold = w;
        }
        if let Some(c) = args.critical {
            self.critical_threshold = c;
        }
        if let Some(m) = args.mode {
            self.mode = m.into();
        }
    }

    pub fn alert_config(&self) -> AlertConfig {
        AlertConfig {
            budget: self.budget_per_block,
            warning: self.warning_threshold,
            critical: self.critical_threshold,
            enabled: self.alerts_enabled,
        }
    }

    pub fn logs_root(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(default_logs_dir)
    }

    pub fn refresh(&self) -> Duration {
        Duration::from_millis(self.refresh_interval.max(1))
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_interval.max(1))
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_FILENAME))
}

fn read_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let cfg = serde_json::from_str(&content)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Load settings from `path`, or `~/.cc-guard.json` when `None`.
///
/// A missing file yields defaults. An unreadable or invalid file is logged
/// and also yields defaults.
pub fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) else {
        return Config::default();
    };
    if !path.is_file() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Config::default();
    }
    match read_config(&path) {
        Ok(cfg) => {
            debug!(path = %path.display(), "loaded config");
            cfg
        }
        Err(e) => {
            warn!("ignoring config file: {e:#}");
            Config::default()
        }
    }
}
