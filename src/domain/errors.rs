//! Domain errors for the dayloop collector.
//!
//! Three taxonomies, one per boundary:
//! - [`AutomationError`]: what the browser port reports
//! - [`InteractionError`]: why one day's exchange failed (day-local)
//! - [`StoreError`]: why persistence failed (fatal to the run)

use thiserror::Error;

/// Errors raised by the browser automation port.
#[derive(Debug, Error)]
pub enum AutomationError {
    /// The element was detached from the page after it was looked up
    #[error("Stale element reference: {0}")]
    StaleElement(String),

    /// The element no longer exists on the page
    #[error("No such element: {0}")]
    NoSuchElement(String),

    /// The driver refused to open a browser session
    ///
    /// Usually a missing Chrome binary or a profile directory already in use
    /// by another Chrome instance.
    #[error("Session not created: {0}")]
    SessionNotCreated(String),

    /// The session was closed, locally or by the driver
    #[error("Browser session is closed")]
    SessionClosed,

    /// Any other error object returned by the driver
    #[error("WebDriver error '{error}': {message}")]
    Protocol {
        /// W3C error code, e.g. `javascript error`
        error: String,
        /// Driver-provided description
        message: String,
    },

    /// The driver could not be reached or returned an unreadable body
    #[error("Transport error: {0}")]
    Transport(String),

    /// The chromedriver process failed to start or become ready
    #[error("Driver process error: {0}")]
    Driver(String),
}

impl AutomationError {
    /// Returns true if the element went away between lookup and use.
    ///
    /// Streaming pages re-render constantly, so these are expected while
    /// sampling and are retried at tick granularity.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AutomationError::StaleElement(_) | AutomationError::NoSuchElement(_)
        )
    }
}

/// Failures of a single day's interaction. None of these end the run.
#[derive(Debug, Error)]
pub enum InteractionError {
    /// The fresh conversation never showed its prompt input
    #[error("Conversation context not ready after {timeout_secs}s (is the browser profile signed in?)")]
    ContextInit {
        /// Configured `context_ready_secs`
        timeout_secs: u64,
    },

    /// The prompt input was missing, or went stale while typing
    #[error("Prompt input not found: {selector}")]
    InputNotFound {
        /// CSS selector that was looked up
        selector: String,
    },

    /// No response unit rendered after the prompt was submitted
    #[error("No response appeared within {timeout_secs}s")]
    NoResponse {
        /// Configured `first_response_secs`
        timeout_secs: u64,
    },

    /// Polling ended (settled or at the ceiling) with no text at all
    #[error("Response finished without any text")]
    EmptyAnswer,

    /// Non-transient browser failure during the exchange
    #[error("Browser automation failed: {0}")]
    Automation(#[from] AutomationError),
}

/// Persistence errors. Any of these is fatal to the run.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Query or connection failure reported by sqlx
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// A stored row could not be decoded (bad id, timestamp or completion)
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The pool was closed; nothing more can be written
    #[error("Store connection is closed")]
    Closed,
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => StoreError::Closed,
            other => StoreError::Database(other),
        }
    }
}
