//! Configuration model. Every section has defaults so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::date_key::{DateKey, DateRange};

/// Main configuration structure for dayloop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Date range and pacing
    #[serde(default)]
    pub run: RunConfig,

    /// Browser / WebDriver configuration
    #[serde(default)]
    pub browser: BrowserConfig,

    /// CSS selectors for the chat page
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Bounded waits inside one interaction
    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    /// Response-completion detector tunables
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Prompt template configuration
    #[serde(default)]
    pub prompt: PromptConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Date range and inter-day pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunConfig {
    /// First date to collect (inclusive)
    #[serde(default = "DateKey::today")]
    pub start_date: DateKey,

    /// Last date to collect (inclusive)
    #[serde(default = "DateKey::today")]
    pub end_date: DateKey,

    /// Pause between consecutive days, in seconds
    #[serde(default = "default_delay_between_days_secs")]
    pub delay_between_days_secs: u64,
}

const fn default_delay_between_days_secs() -> u64 {
    15
}

impl RunConfig {
    /// Configured dates as an inclusive range
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    /// `delay_between_days_secs` as a [`Duration`]
    pub fn delay_between_days(&self) -> Duration {
        Duration::from_secs(self.delay_between_days_secs)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start_date: DateKey::today(),
            end_date: DateKey::today(),
            delay_between_days_secs: default_delay_between_days_secs(),
        }
    }
}

/// Browser / WebDriver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BrowserConfig {
    /// chromedriver executable, spawned when `webdriver_url` is unset
    #[serde(default = "default_chromedriver_path")]
    pub chromedriver_path: String,

    /// Use an already running WebDriver endpoint instead of spawning one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webdriver_url: Option<String>,

    /// Port for the spawned chromedriver
    #[serde(default = "default_port")]
    pub port: u16,

    /// Chrome user data directory holding the signed-in profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data_dir: Option<String>,

    /// Profile directory inside `user_data_dir`
    #[serde(default = "default_profile_name")]
    pub profile_name: String,

    /// Chat page that opens a fresh conversation
    #[serde(default = "default_chat_url")]
    pub chat_url: String,

    /// Run Chrome headless
    #[serde(default)]
    pub headless: bool,

    /// Additional Chrome command-line switches
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// How long to wait for chromedriver to report ready
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,
}

fn default_chromedriver_path() -> String {
    "chromedriver".to_string()
}

const fn default_port() -> u16 {
    9515
}

fn default_profile_name() -> String {
    "Default".to_string()
}

fn default_chat_url() -> String {
    "https://chat.openai.com".to_string()
}

const fn default_startup_timeout_secs() -> u64 {
    20
}

impl BrowserConfig {
    /// `startup_timeout_secs` as a [`Duration`]
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chromedriver_path: default_chromedriver_path(),
            webdriver_url: None,
            port: default_port(),
            user_data_dir: None,
            profile_name: default_profile_name(),
            chat_url: default_chat_url(),
            headless: false,
            extra_args: vec![],
            startup_timeout_secs: default_startup_timeout_secs(),
        }
    }
}

/// CSS selectors for the chat page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SelectorConfig {
    /// Prompt input surface
    #[serde(default = "default_prompt_input_selector")]
    pub prompt_input: String,

    /// One element per assistant response unit
    #[serde(default = "default_assistant_message_selector")]
    pub assistant_message: String,
}

fn default_prompt_input_selector() -> String {
    "div.ProseMirror#prompt-textarea".to_string()
}

fn default_assistant_message_selector() -> String {
    r#"div[data-message-author-role="assistant"]"#.to_string()
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            prompt_input: default_prompt_input_selector(),
            assistant_message: default_assistant_message_selector(),
        }
    }
}

/// Bounded waits inside one interaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TimeoutsConfig {
    /// Fresh conversation must show its input within this time
    #[serde(default = "default_context_ready_secs")]
    pub context_ready_secs: u64,

    /// Input lookup before typing the prompt
    #[serde(default = "default_input_lookup_secs")]
    pub input_lookup_secs: u64,

    /// First response unit must appear within this time
    #[serde(default = "default_first_response_secs")]
    pub first_response_secs: u64,

    /// Sampling tick while the answer streams
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Delay before re-sampling after a transient lookup failure
    #[serde(default = "default_transient_retry_ms")]
    pub transient_retry_ms: u64,

    /// Pause after the fresh conversation becomes ready
    #[serde(default = "default_ui_settle_ms")]
    pub ui_settle_ms: u64,
}

const fn default_context_ready_secs() -> u64 {
    60
}

const fn default_input_lookup_secs() -> u64 {
    30
}

const fn default_first_response_secs() -> u64 {
    180
}

const fn default_poll_interval_ms() -> u64 {
    1000
}

const fn default_transient_retry_ms() -> u64 {
    500
}

const fn default_ui_settle_ms() -> u64 {
    500
}

impl TimeoutsConfig {
    /// `context_ready_secs` as a [`Duration`]
    pub fn context_ready(&self) -> Duration {
        Duration::from_secs(self.context_ready_secs)
    }

    /// `input_lookup_secs` as a [`Duration`]
    pub fn input_lookup(&self) -> Duration {
        Duration::from_secs(self.input_lookup_secs)
    }

    /// `first_response_secs` as a [`Duration`]
    pub fn first_response(&self) -> Duration {
        Duration::from_secs(self.first_response_secs)
    }

    /// `poll_interval_ms` as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// `transient_retry_ms` as a [`Duration`]
    pub fn transient_retry(&self) -> Duration {
        Duration::from_millis(self.transient_retry_ms)
    }

    /// `ui_settle_ms` as a [`Duration`]
    pub fn ui_settle(&self) -> Duration {
        Duration::from_millis(self.ui_settle_ms)
    }
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            context_ready_secs: default_context_ready_secs(),
            input_lookup_secs: default_input_lookup_secs(),
            first_response_secs: default_first_response_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            transient_retry_ms: default_transient_retry_ms(),
            ui_settle_ms: default_ui_settle_ms(),
        }
    }
}

/// Response-completion detector tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DetectorConfig {
    /// Seconds without textual change before the answer counts as finished
    #[serde(default = "default_stability_window_secs")]
    pub stability_window_secs: u64,

    /// Absolute ceiling on polling one answer
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,

    /// Characters required before quiescence alone is trusted
    #[serde(default = "default_min_answer_length")]
    pub min_answer_length: usize,
}

const fn default_stability_window_secs() -> u64 {
    20
}

const fn default_max_wait_secs() -> u64 {
    240
}

const fn default_min_answer_length() -> usize {
    120
}

impl DetectorConfig {
    /// `stability_window_secs` as a [`Duration`]
    pub fn stability_window(&self) -> Duration {
        Duration::from_secs(self.stability_window_secs)
    }

    /// `max_wait_secs` as a [`Duration`]
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            stability_window_secs: default_stability_window_secs(),
            max_wait_secs: default_max_wait_secs(),
            min_answer_length: default_min_answer_length(),
        }
    }
}

/// Prompt template configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PromptConfig {
    /// Template file with `{date}` / `{iso_date}` placeholders; built-in when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_path: Option<PathBuf>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".dayloop/dayloop.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl DatabaseConfig {
    /// sqlx connection URL for the configured path.
    pub fn url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            self.path.clone()
        } else {
            format!("sqlite:{}", self.path)
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for daily-rotated JSON log files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
