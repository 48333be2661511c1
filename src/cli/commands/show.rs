//! `dayloop show <date>`: print one stored record.

use anyhow::Result;
use clap::Args;
use console::style;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, DateKey, StoredRecord};

use super::open_store;

/// Show the stored record for a date
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Date to show, YYYY-MM-DD
    pub date: DateKey,
}

#[derive(Serialize)]
#[serde(transparent)]
struct ShowOutput(StoredRecord);

impl CommandOutput for ShowOutput {
    fn to_human(&self) -> String {
        let stored = &self.0;
        let record = &stored.record;
        let mut out = format!(
            "{} {}\n  id:         {}\n  completion: {}\n  recorded:   {}\n  created:    {}\n",
            style("Date").bold(),
            record.date,
            stored.id,
            record.completion.as_str(),
            record.recorded_at.to_rfc3339(),
            stored.created_at.to_rfc3339(),
        );
        out.push_str(&format!("\n{}\n{}\n", style("Prompt").bold(), record.prompt));
        out.push_str(&format!("\n{}\n{}", style("Answer").bold(), record.answer));
        out
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.0).unwrap_or_default()
    }
}

/// Print the record stored for one date
pub async fn execute(args: ShowArgs, config: Config, json_mode: bool) -> Result<()> {
    let store = open_store(&config.database).await?;
    let found = store.get(args.date).await;
    store.close().await;

    match found? {
        Some(record) => {
            output(&ShowOutput(record), json_mode);
            Ok(())
        }
        None => anyhow::bail!("No record stored for {}", args.date),
    }
}
