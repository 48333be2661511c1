//! Port trait definitions (Hexagonal Architecture)
//!
//! - BrowserAutomation: the pre-authenticated browser session driving the chat page
//! - InteractionStore: upsert-by-date persistence of collected answers
//!
//! Adapters under `crate::adapters` implement these; the application layer
//! only sees the traits.

pub mod browser;
pub mod interaction_store;

pub use browser::{BrowserAutomation, ElementHandle, Key};
pub use interaction_store::InteractionStore;
