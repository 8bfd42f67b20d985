//! Layered settings.
//!
//! Sources, lowest priority first: built-in defaults, an optional config
//! file (TOML, YAML or JSON by extension), `SHEETWATCH_*` environment
//! variables, then command-line overrides.
//!
//! ```toml
//! base_url = "http://192.168.0.10:8000"
//! poll_seconds = 8
//! stats_poll_seconds = 15
//! log_file = "/tmp/sheetwatch.log"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Prefix for environment overrides (`SHEETWATCH_POLL_SECONDS`, ...).
pub const ENV_PREFIX: &str = "SHEETWATCH";

/// Log target of the poll cycles.
const POLLER_TARGET: &str = "sheetwatch::poller";

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Base URL of the sheet viewer API.
    pub base_url: String,
    pub data_path: String,
    pub stats_path: String,
    /// Table polling interval.
    pub poll_seconds: u64,
    /// Statistics polling interval.
    pub stats_poll_seconds: u64,
    pub request_timeout_secs: u64,
    /// Log destination while the TUI owns the terminal.
    pub log_file: PathBuf,
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub log_filter: String,
}

/// Values given on the command line; `None` keeps the lower layers.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub poll_seconds: Option<u64>,
    pub stats_poll_seconds: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

impl Settings {
    /// Load settings from defaults, file, environment and overrides.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::load_with_env(
            path,
            overrides,
            Environment::with_prefix(ENV_PREFIX).try_parsing(true),
        )
    }

    fn load_with_env(path: Option<&Path>, overrides: &Overrides, env: Environment) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("base_url", "http://127.0.0.1:8000")?
            .set_default("data_path", "/api/data")?
            .set_default("stats_path", "/api/stats")?
            .set_default("poll_seconds", 8)?
            .set_default("stats_poll_seconds", 15)?
            .set_default("request_timeout_secs", 10)?
            .set_default("log_file", "sheetwatch.log")?
            .set_default("log_filter", "sheetwatch=info")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings: Settings = builder
            .add_source(env)
            .set_override_option("base_url", overrides.base_url.clone())?
            .set_override_option("poll_seconds", overrides.poll_seconds)?
            .set_override_option("stats_poll_seconds", overrides.stats_poll_seconds)?
            .set_override_option("request_timeout_secs", overrides.request_timeout_secs)?
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.poll_seconds == 0 {
            bail!("poll_seconds must be greater than zero");
        }
        if self.stats_poll_seconds == 0 {
            bail!("stats_poll_seconds must be greater than zero");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        if self.base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }
        Ok(())
    }

    /// Filter directive for the given mode.
    ///
    /// Headless mode exists to watch cycles, so it also enables the poller's
    /// per-cycle debug lines unless the filter already sets that target.
    pub fn log_filter_for(&self, headless: bool) -> String {
        if headless && !self.log_filter.contains(POLLER_TARGET) {
            format!("{},{}=debug", self.log_filter, POLLER_TARGET)
        } else {
            self.log_filter.clone()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_seconds)
    }

    pub fn stats_poll_interval(&self) -> Duration {
        Duration::from_secs(self.stats_poll_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
