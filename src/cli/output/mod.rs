//! Output formatting utilities for the CLI.

pub mod progress;
pub mod table;

use serde::Serialize;

/// Command result printable for people or as JSON
pub trait CommandOutput: Serialize {
    /// Terminal rendering
    fn to_human(&self) -> String;
    /// Machine-readable rendering
    fn to_json(&self) -> serde_json::Value;
}

/// Print `result` in the selected mode
pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&result.to_json()).unwrap_or_default()
        );
    } else {
        println!("{}", result.to_human());
    }
}

/// Truncate to at most `max_chars` characters, appending "..." if truncated.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
