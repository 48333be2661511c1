//! `dayloop list`: stored dates within a range.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::output::table::format_records;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, DateKey, DateRange, StoredRecord};

use super::open_store;

/// List stored dates
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// First date, YYYY-MM-DD (default: earliest stored)
    #[arg(long)]
    pub start: Option<DateKey>,

    /// Last date, YYYY-MM-DD (default: latest stored)
    #[arg(long)]
    pub end: Option<DateKey>,
}

impl ListArgs {
    /// Requested bounds, open ends widened to every representable date
    pub fn range(&self) -> DateRange {
        let earliest = || DateKey::from_ymd(1, 1, 1).unwrap_or_else(DateKey::today);
        let latest = || DateKey::from_ymd(9999, 12, 31).unwrap_or_else(DateKey::today);
        DateRange::new(
            self.start.unwrap_or_else(earliest),
            self.end.unwrap_or_else(latest),
        )
    }
}

#[derive(Serialize)]
struct ListOutput {
    records: Vec<StoredRecord>,
    #[serde(skip)]
    use_colors: bool,
}

impl CommandOutput for ListOutput {
    fn to_human(&self) -> String {
        if self.records.is_empty() {
            return "No stored records".to_string();
        }
        format!(
            "{}\n{} record(s)",
            format_records(&self.records, self.use_colors),
            self.records.len()
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "count": self.records.len(),
            "records": self.records,
        })
    }
}

/// Print a table of stored dates in the range
pub async fn execute(args: ListArgs, config: Config, json_mode: bool) -> Result<()> {
    let store = open_store(&config.database).await?;
    let records = store.list(&args.range()).await;
    store.close().await;

    output(
        &ListOutput {
            records: records?,
            use_colors: console::colors_enabled(),
        },
        json_mode,
    );
    Ok(())
}
