//! Domain models: dates, interaction records, run reports and configuration.

pub mod config;
pub mod date_key;
pub mod interaction;
pub mod run;

pub use config::{
    BrowserConfig, Config, DatabaseConfig, DetectorConfig, LoggingConfig, PromptConfig, RunConfig,
    SelectorConfig, TimeoutsConfig,
};
pub use date_key::{DateKey, DateKeyParseError, DateRange, DateRangeIter};
pub use interaction::{Completion, InteractionOutcome, InteractionRecord, StoredId, StoredRecord};
pub use run::{DayReport, DayStatus, RunSummary, StopReason, TeardownReport};
