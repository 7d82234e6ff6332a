//! Supervisor configuration
//!
//! Loaded from an optional TOML file. Every field has a default so an empty
//! or missing file yields a working configuration rooted at `base_dir`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SupervisorError;

/// Default capacity of the failure event channel shared by all tailers.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// Delay before re-reading an event log that has no complete record.
pub const DEFAULT_TAIL_BACKOFF_MS: u64 = 100;

/// Count polls allowed while waiting for deleted services to disappear.
pub const DEFAULT_DELETE_MAX_RETRIES: u32 = 100;

/// Interval between count polls during teardown.
pub const DEFAULT_DELETE_POLL_INTERVAL_MS: u64 = 5;

/// Upper bound on a single external command.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;

#[cfg(windows)]
const DEFAULT_BASE_DIR: &str = "C:\\var\\vcap";
#[cfg(not(windows))]
const DEFAULT_BASE_DIR: &str = "/var/vcap";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SupervisorConfig {
    pub base_dir: PathBuf,
    /// Per-job log directories live here (`<logs_dir>/<job>/<process>`)
    pub logs_dir: Option<PathBuf>,
    /// Holds the service wrapper executable copied into each process dir
    pub bin_dir: Option<PathBuf>,
    /// Holds the stopped marker
    pub monit_dir: Option<PathBuf>,
    /// Interpreter used for service manager queries
    pub interpreter: String,
    pub interpreter_args: Vec<String>,
    pub channel_capacity: usize,
    pub tail_backoff_ms: u64,
    pub delete_max_retries: u32,
    pub delete_poll_interval_ms: u64,
    pub command_timeout_secs: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            logs_dir: None,
            bin_dir: None,
            monit_dir: None,
            interpreter: "powershell".to_string(),
            interpreter_args: vec![
                "-noprofile".to_string(),
                "-noninteractive".to_string(),
                "/C".to_string(),
            ],
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            tail_backoff_ms: DEFAULT_TAIL_BACKOFF_MS,
            delete_max_retries: DEFAULT_DELETE_MAX_RETRIES,
            delete_poll_interval_ms: DEFAULT_DELETE_POLL_INTERVAL_MS,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
        }
    }
}

impl SupervisorConfig {
    /// Configuration rooted at `base_dir` with every other field defaulted.
    pub fn with_base_dir(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is
    /// an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            return Err(
                SupervisorError::InvalidConfig("channel_capacity must be at least 1".into()).into(),
            );
        }
        if self.delete_max_retries == 0 {
            return Err(SupervisorError::InvalidConfig(
                "delete_max_retries must be at least 1".into(),
            )
            .into());
        }
        if self.interpreter.trim().is_empty() {
            return Err(SupervisorError::InvalidConfig("interpreter must be set".into()).into());
        }
        Ok(())
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.logs_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("sys").join("log"))
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.bin_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("bosh").join("bin"))
    }

    pub fn monit_dir(&self) -> PathBuf {
        self.monit_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("monit"))
    }

    pub fn tail_backoff(&self) -> Duration {
        Duration::from_millis(self.tail_backoff_ms)
    }

    pub fn delete_poll_interval(&self) -> Duration {
        Duration::from_millis(self.delete_poll_interval_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}
