//! Command-line interface.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

use console::style;

/// Print the error in the selected output mode and exit with failure.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );
    } else {
        eprintln!("{} {err:#}", style("Error:").red().bold());
    }
    std::process::exit(1);
}
