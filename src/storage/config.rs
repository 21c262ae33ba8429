//! Settings file loading and precedence resolution.
//!
//! Loads settings from:
//! - Linux: `~/.config/tracking-day/config.toml`
//! - macOS: `~/Library/Application Support/com.daylily.tracking-day/config.toml`
//! - Windows: `%APPDATA%/daylily/tracking-day/config/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `TRACKING_DAY_ENV`: Credential environment (default `prod`)
//! - `TRACKING_DAY_TIMEOUT`: Request timeout in seconds
//! - `TRACKING_DAY_PRETTY`: Pretty-print JSON output (1, true, yes)
//! - `TRACKING_DAY_CONFIG`: Override settings file path
//! - `TRACKING_DAY_CONFIG_DIR`: Override credentials root directory

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::core::carrier::DEFAULT_ENVIRONMENT;
use crate::error::{Result, TrackDayError};
use crate::util::env::{is_truthy, var_nonempty};

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable for the credential environment.
pub const ENV_ENVIRONMENT: &str = "TRACKING_DAY_ENV";
/// Environment variable for timeout in seconds.
pub const ENV_TIMEOUT: &str = "TRACKING_DAY_TIMEOUT";
/// Environment variable for pretty JSON output.
pub const ENV_PRETTY: &str = "TRACKING_DAY_PRETTY";
/// Environment variable to override the settings file path.
pub const ENV_CONFIG: &str = "TRACKING_DAY_CONFIG";

// =============================================================================
// Settings File
// =============================================================================

/// Application settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub output: OutputConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Credential environment to use when none is given.
    pub environment: Option<String>,
    /// Timeout for each outbound request, in seconds.
    pub timeout_seconds: u64,
    /// Hours without a new event before an undelivered shipment needs attention.
    pub stale_after_hours: u64,
}

/// Output formatting configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            environment: None,
            timeout_seconds: 30,
            stale_after_hours: 72,
        }
    }
}

impl Config {
    /// Load from `TRACKING_DAY_CONFIG` if set, else the default path.
    ///
    /// # Errors
    ///
    /// Returns error only if the file exists but is invalid.
    pub fn load() -> Result<Self> {
        match var_nonempty(ENV_CONFIG) {
            Some(path) => Self::load_from(Path::new(&path)),
            None => Self::load_from(&AppPaths::new().settings_file()),
        }
    }

    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but is unreadable, not TOML, or
    /// holds out-of-range values.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Settings file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading settings file");
        let content = fs::read_to_string(path).map_err(|e| TrackDayError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| TrackDayError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// `ConfigInvalid` when the timeout is outside 1-300 seconds, the
    /// staleness window is zero, or the environment name is blank.
    pub fn validate(&self) -> Result<()> {
        if self.general.timeout_seconds == 0 || self.general.timeout_seconds > 300 {
            return Err(TrackDayError::ConfigInvalid {
                key: "general.timeout_seconds".to_string(),
                message: "must be between 1 and 300".to_string(),
            });
        }
        if self.general.stale_after_hours == 0 {
            return Err(TrackDayError::ConfigInvalid {
                key: "general.stale_after_hours".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if let Some(env) = &self.general.environment
            && env.trim().is_empty()
        {
            return Err(TrackDayError::ConfigInvalid {
                key: "general.environment".to_string(),
                message: "must not be blank".to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Resolved Settings
// =============================================================================

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Values given on the command line, if any.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub environment: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub pretty: bool,
    pub config_dir: Option<PathBuf>,
}

/// Final settings after merging CLI, env vars, and the settings file.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub environment: String,
    pub timeout: Duration,
    pub stale_after: Duration,
    pub pretty: bool,
    pub credentials_root: PathBuf,
    pub environment_source: ConfigSource,
    pub timeout_source: ConfigSource,
}

impl ResolvedSettings {
    /// Resolve from the default settings file.
    ///
    /// # Errors
    ///
    /// Returns error if the settings file is invalid or an override is out of range.
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        Self::resolve_with(cli, &Config::load()?)
    }

    /// Resolve against an already-loaded settings file.
    ///
    /// # Errors
    ///
    /// `ConfigInvalid` when the resolved timeout is out of range.
    pub fn resolve_with(cli: &CliOverrides, config: &Config) -> Result<Self> {
        let (environment, environment_source) = Self::resolve_environment(cli, config);
        let (timeout_seconds, timeout_source) = Self::resolve_timeout(cli, config);

        if timeout_seconds == 0 || timeout_seconds > 300 {
            return Err(TrackDayError::ConfigInvalid {
                key: "timeout".to_string(),
                message: format!("must be between 1 and 300 seconds (got {timeout_seconds})"),
            });
        }

        let credentials_root = cli
            .config_dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().credentials_root);

        Ok(Self {
            environment,
            timeout: Duration::from_secs(timeout_seconds),
            stale_after: Duration::from_secs(config.general.stale_after_hours * 3600),
            pretty: cli.pretty || is_truthy(ENV_PRETTY) || config.output.pretty,
            credentials_root,
            environment_source,
            timeout_source,
        })
    }

    fn resolve_environment(cli: &CliOverrides, config: &Config) -> (String, ConfigSource) {
        if let Some(env) = cli.environment.as_deref().filter(|e| !e.trim().is_empty()) {
            return (env.trim().to_string(), ConfigSource::Cli);
        }
        if let Some(env) = var_nonempty(ENV_ENVIRONMENT) {
            return (env, ConfigSource::Env);
        }
        if let Some(env) = &config.general.environment {
            return (env.clone(), ConfigSource::ConfigFile);
        }
        (DEFAULT_ENVIRONMENT.to_string(), ConfigSource::Default)
    }

    fn resolve_timeout(cli: &CliOverrides, config: &Config) -> (u64, ConfigSource) {
        if let Some(timeout) = cli.timeout_seconds {
            return (timeout, ConfigSource::Cli);
        }
        if let Some(timeout) = var_nonempty(ENV_TIMEOUT).and_then(|v| v.parse::<u64>().ok()) {
            return (timeout, ConfigSource::Env);
        }
        (config.general.timeout_seconds, ConfigSource::ConfigFile)
    }
}
