use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use holescope_logs::{DEFAULT_REFERENCE_YEAR, MalformedLinePolicy};

use crate::Args;

pub const DEFAULT_LOG_PATH: &str = "/var/log/pihole.log";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Runtime settings, from an optional TOML file overridden by CLI flags
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Log file to open
    pub log_path: PathBuf,

    /// Keep reading lines appended to the file
    pub follow: bool,

    /// How often the follower checks the file
    pub poll_interval_ms: u64,

    /// Year stamped on records, since log lines carry none
    pub reference_year: i32,

    /// What to do with lines that cannot be parsed
    pub malformed_lines: MalformedLinePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            follow: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            reference_year: DEFAULT_REFERENCE_YEAR,
            malformed_lines: MalformedLinePolicy::default(),
        }
    }
}

impl Config {
    /// Read a config file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Build the effective configuration for a run
    pub fn resolve(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    /// CLI flags win over file values
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(path) = &args.path {
            self.log_path = path.clone();
        }
        if args.follow {
            self.follow = true;
        }
        if let Some(ms) = args.poll_ms {
            self.poll_interval_ms = ms;
        }
        if let Some(year) = args.reference_year {
            self.reference_year = year;
        }
        if args.abort_on_malformed {
            self.malformed_lines = MalformedLinePolicy::Abort;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than zero");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
