//! Layered configuration loading and validation.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project config, created by hand or copied from the README
pub const PROJECT_CONFIG: &str = ".dayloop/config.yaml";
/// Optional local overrides, not meant to be committed
pub const LOCAL_CONFIG: &str = ".dayloop/local.yaml";
/// Prefix for environment overrides; nested keys are split on `__`
pub const ENV_PREFIX: &str = "DAYLOOP_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Wait ceiling of zero would abort every answer immediately
    #[error("Invalid max_wait_secs: {0}. Must be at least 1")]
    InvalidMaxWait(u64),

    /// Zero sampling tick
    #[error("Invalid poll_interval_ms: {0}. Must be at least 1")]
    InvalidPollInterval(u64),

    /// Zero retry delay after a stale or missing element
    #[error("Invalid transient_retry_ms: {0}. Must be at least 1")]
    InvalidTransientRetry(u64),

    /// Stability window longer than the ceiling, so no answer could ever settle
    #[error(
        "Invalid detector configuration: stability_window_secs ({0}) must not exceed max_wait_secs ({1})"
    )]
    WindowExceedsMaxWait(u64, u64),

    /// A required CSS selector is blank; holds the field name
    #[error("Selector '{0}' cannot be empty")]
    EmptySelector(&'static str),

    /// No chat page to open
    #[error("Chat URL cannot be empty")]
    EmptyChatUrl,

    /// Unknown tracing level
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Unknown output format
    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    /// No database file configured
    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    /// Pool would have no connections
    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .dayloop/config.yaml (project config)
    /// 3. .dayloop/local.yaml (local overrides, optional)
    /// 4. Environment variables (DAYLOOP_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        Self::load_layered(None)
    }

    /// Same layering as [`ConfigLoader::load`], with `explicit` merged after
    /// the project files and before the environment.
    pub fn load_layered(explicit: Option<&Path>) -> Result<Config> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(PROJECT_CONFIG))
            .merge(Yaml::file(LOCAL_CONFIG));

        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file {} does not exist", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }

        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    ///
    /// A start date after the end date is valid and means "nothing to do".
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let detector = &config.detector;
        if detector.max_wait_secs == 0 {
            return Err(ConfigError::InvalidMaxWait(detector.max_wait_secs));
        }
        if detector.stability_window_secs > detector.max_wait_secs {
            return Err(ConfigError::WindowExceedsMaxWait(
                detector.stability_window_secs,
                detector.max_wait_secs,
            ));
        }

        if config.timeouts.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval(
                config.timeouts.poll_interval_ms,
            ));
        }
        if config.timeouts.transient_retry_ms == 0 {
            return Err(ConfigError::InvalidTransientRetry(
                config.timeouts.transient_retry_ms,
            ));
        }

        if config.selectors.prompt_input.trim().is_empty() {
            return Err(ConfigError::EmptySelector("prompt_input"));
        }
        if config.selectors.assistant_message.trim().is_empty() {
            return Err(ConfigError::EmptySelector("assistant_message"));
        }

        if config.browser.chat_url.trim().is_empty() {
            return Err(ConfigError::EmptyChatUrl);
        }

        // Validate database config
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        // Validate logging config
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}
