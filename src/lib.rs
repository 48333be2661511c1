//! Dayloop - daily chat-agent collector
//!
//! Dayloop walks a range of calendar dates and, for each one, opens a fresh
//! conversation in a signed-in chat web UI, submits a date-specific prompt,
//! waits for the streamed answer to settle, and upserts the answer into a
//! local store keyed by date.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and the port traits
//! - **Application Layer** (`application`): detector, session and orchestrator
//! - **Service Layer** (`services`): prompt rendering
//! - **Adapters** (`adapters`): SQLite store and WebDriver browser
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use dayloop::application::{DayOrchestrator, InteractionSession, SessionSettings};
//!
//! let session = InteractionSession::new(browser, PromptBuilder::builtin(), settings);
//! let summary = DayOrchestrator::new(session, store)
//!     .run_range(range, delay, CancellationToken::new())
//!     .await;
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{
    DayOrchestrator, Decision, InteractionSession, RunEvent, SessionSettings, StabilityDetector,
    StreamSample,
};
pub use domain::models::{
    Completion, Config, DateKey, DateRange, DayReport, DayStatus, InteractionRecord, RunSummary,
    StopReason, StoredId,
};
pub use domain::ports::{BrowserAutomation, InteractionStore};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::PromptBuilder;
