//! Browser automation over the W3C WebDriver HTTP protocol.

pub mod capabilities;
pub mod chromedriver;
pub mod client;

pub use chromedriver::ChromeDriverProcess;
pub use client::{WebDriverClient, ELEMENT_KEY};
