//! Browser automation port.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::domain::errors::AutomationError;

/// Opaque reference to an element on the current page.
///
/// Handles go stale when the page re-renders; every use may fail with
/// [`AutomationError::StaleElement`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(String);

impl ElementHandle {
    /// Wrap a driver element reference
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Driver element reference
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Special keys sent to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Submit
    Enter,
    /// Soft line break inside a multi-line input
    ShiftEnter,
}

/// A browser session that is already signed in to the chat service.
///
/// Lookups are bounded by a timeout and report "nothing found" as `None` or
/// an empty list rather than as an error. Errors are reserved for transport
/// and protocol failures.
#[async_trait]
pub trait BrowserAutomation: Send + Sync {
    /// Load a URL in the current tab.
    async fn navigate(&self, url: &str) -> Result<(), AutomationError>;

    /// Wait up to `timeout` for an element matching the CSS selector.
    async fn find_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<ElementHandle>, AutomationError>;

    /// Wait up to `timeout` for at least one match. A zero timeout samples once.
    async fn find_elements(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<ElementHandle>, AutomationError>;

    /// Rendered text of an element.
    async fn element_text(&self, element: &ElementHandle) -> Result<String, AutomationError>;

    /// Click (focus) an element.
    async fn click(&self, element: &ElementHandle) -> Result<(), AutomationError>;

    /// Type plain text into an element.
    async fn send_text(&self, element: &ElementHandle, text: &str) -> Result<(), AutomationError>;

    /// Send a special key to an element.
    async fn send_key(&self, element: &ElementHandle, key: Key) -> Result<(), AutomationError>;

    /// Scroll so the element is rendered.
    async fn scroll_into_view(&self, element: &ElementHandle) -> Result<(), AutomationError>;

    /// End the browser session and release anything it started.
    async fn close(&self) -> Result<(), AutomationError>;
}
