//! Configuration file loading with precedence handling.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::state::ViewSettings;
use crate::sync::{BackoffPolicy, SyncConfig};

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "READSYNC_CONFIG";
/// Environment override for `debounce_ms`.
pub const DEBOUNCE_ENV: &str = "READSYNC_DEBOUNCE_MS";
/// Environment override for `activity_interval_secs`.
pub const ACTIVITY_INTERVAL_ENV: &str = "READSYNC_ACTIVITY_INTERVAL_SECS";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// An override environment variable is set to something unparsable.
    #[error("Invalid value {value:?} for {name}")]
    InvalidEnvValue {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },

    /// The resolved values contradict each other.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/readsync/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Debounce window for coalescing read receipts.
    #[serde(default)]
    pub debounce_ms: Option<u64>,

    /// Delay after the first failed delivery.
    #[serde(default)]
    pub backoff_base_ms: Option<u64>,

    /// Upper bound on the retry delay.
    #[serde(default)]
    pub backoff_max_ms: Option<u64>,

    /// Fraction of each retry delay removed at random.
    #[serde(default)]
    pub backoff_jitter: Option<f64>,

    /// Minimum seconds between presence registrations.
    #[serde(default)]
    pub activity_interval_secs: Option<u64>,

    /// Distance from the bottom still treated as "at the bottom".
    #[serde(default)]
    pub near_bottom_threshold: Option<f64>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Quiet period before a pending batch is sent, in milliseconds.
    pub debounce_ms: u64,
    /// First retry delay, in milliseconds.
    pub backoff_base_ms: u64,
    /// Retry delay cap, in milliseconds.
    pub backoff_max_ms: u64,
    /// Fraction of the delay that may be shaved off at random (0.0..=1.0).
    pub backoff_jitter: f64,
    /// Minimum seconds between presence registrations.
    pub activity_interval_secs: u64,
    /// Offset at or below which the viewport counts as at the bottom.
    pub near_bottom_threshold: f64,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 250,
            backoff_base_ms: 1_000,
            backoff_max_ms: 60_000,
            backoff_jitter: 0.2,
            activity_interval_secs: 15,
            near_bottom_threshold: 24.0,
            log_file_path: default_log_path(),
        }
    }
}

impl ResolvedConfig {
    /// Reject combinations the sync queue cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backoff_base_ms == 0 {
            return Err(ConfigError::Invalid(
                "backoff_base_ms must be greater than zero".to_string(),
            ));
        }
        if self.backoff_base_ms > self.backoff_max_ms {
            return Err(ConfigError::Invalid(format!(
                "backoff_base_ms ({}) exceeds backoff_max_ms ({})",
                self.backoff_base_ms, self.backoff_max_ms
            )));
        }
        if !(0.0..=1.0).contains(&self.backoff_jitter) {
            return Err(ConfigError::Invalid(format!(
                "backoff_jitter ({}) must be within [0, 1]",
                self.backoff_jitter
            )));
        }
        Ok(())
    }

    /// Sync queue tuning.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            backoff: BackoffPolicy {
                base: Duration::from_millis(self.backoff_base_ms),
                max: Duration::from_millis(self.backoff_max_ms),
                jitter: self.backoff_jitter,
            },
        }
    }

    /// Minimum time between presence registrations.
    pub fn activity_interval(&self) -> Duration {
        Duration::from_secs(self.activity_interval_secs)
    }

    /// Everything a conversation view needs.
    pub fn view_settings(&self) -> ViewSettings {
        ViewSettings {
            sync: self.sync_config(),
            activity_interval: self.activity_interval(),
            near_bottom_threshold: self.near_bottom_threshold,
        }
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/readsync/readsync.log` on Linux, or the
/// platform's state directory elsewhere. Falls back to the current
/// directory if no state directory is known.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("readsync").join("readsync.log")
    } else {
        PathBuf::from("readsync.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    // Missing file is not an error - use defaults
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path (`~/.config/readsync/config.toml` on Linux).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("readsync").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `READSYNC_CONFIG` environment variable
/// 3. Default path `~/.config/readsync/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Apply environment variable overrides to resolved config.
///
/// Checks `READSYNC_DEBOUNCE_MS` and `READSYNC_ACTIVITY_INTERVAL_SECS`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvValue`] if a set variable is not an
/// unsigned integer.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> Result<ResolvedConfig, ConfigError> {
    if let Some(debounce) = env_u64(DEBOUNCE_ENV)? {
        config.debounce_ms = debounce;
    }
    if let Some(interval) = env_u64(ACTIVITY_INTERVAL_ENV)? {
        config.activity_interval_secs = interval;
    }
    Ok(config)
}

fn env_u64(name: &'static str) -> Result<Option<u64>, ConfigError> {
    let Ok(value) = std::env::var(name) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidEnvValue { name, value })
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        debounce_ms: config.debounce_ms.unwrap_or(defaults.debounce_ms),
        backoff_base_ms: config.backoff_base_ms.unwrap_or(defaults.backoff_base_ms),
        backoff_max_ms: config.backoff_max_ms.unwrap_or(defaults.backoff_max_ms),
        backoff_jitter: config.backoff_jitter.unwrap_or(defaults.backoff_jitter),
        activity_interval_secs: config
            .activity_interval_secs
            .unwrap_or(defaults.activity_interval_secs),
        near_bottom_threshold: config
            .near_bottom_threshold
            .unwrap_or(defaults.near_bottom_threshold),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Apply CLI argument overrides to resolved config.
///
/// Only flags the user actually passed override anything.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    debounce_override: Option<u64>,
    log_file_override: Option<PathBuf>,
) -> ResolvedConfig {
    if let Some(debounce) = debounce_override {
        config.debounce_ms = debounce;
    }

    if let Some(path) = log_file_override {
        config.log_file_path = path;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
