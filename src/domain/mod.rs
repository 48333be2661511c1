//! Domain layer for the dayloop collector
//!
//! Core types (date keys, interaction records, run summaries), the error
//! taxonomy, and the port traits that adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{AutomationError, InteractionError, StoreError};
