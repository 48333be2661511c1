//! Application layer: the daily interaction use case.
//!
//! - [`StabilityDetector`] decides when a streamed answer is finished
//! - [`InteractionSession`] runs one prompt/answer exchange for a date
//! - [`DayOrchestrator`] walks a date range and persists each answer

pub mod day_orchestrator;
pub mod interaction_session;
pub mod stability_detector;

pub use day_orchestrator::{DayOrchestrator, RunEvent};
pub use interaction_session::{InteractionSession, SessionSettings};
pub use stability_detector::{evaluate, CompletionState, Decision, StabilityDetector, StreamSample};
