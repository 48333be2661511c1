//! `dayloop run`: collect one answer per date.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::adapters::webdriver::WebDriverClient;
use crate::application::{DayOrchestrator, InteractionSession, RunEvent, SessionSettings};
use crate::cli::output::progress::ConsoleReporter;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, DateKey, DateRange, RunSummary, StopReason};
use crate::domain::ports::BrowserAutomation;
use crate::services::PromptBuilder;

use super::open_store;

/// Run one interaction per date in the range and store the answers
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// First date, YYYY-MM-DD (overrides run.start_date)
    #[arg(long)]
    pub start: Option<DateKey>,

    /// Last date, YYYY-MM-DD (overrides run.end_date)
    #[arg(long)]
    pub end: Option<DateKey>,

    /// Seconds to wait between days (overrides run.delay_between_days_secs)
    #[arg(long)]
    pub delay: Option<u64>,
}

impl RunArgs {
    /// Range and inter-day delay after applying CLI overrides to `config`.
    pub fn resolve(&self, config: &Config) -> (DateRange, Duration) {
        let range = DateRange::new(
            self.start.unwrap_or(config.run.start_date),
            self.end.unwrap_or(config.run.end_date),
        );
        let delay = self
            .delay
            .map_or_else(|| config.run.delay_between_days(), Duration::from_secs);
        (range, delay)
    }
}

#[derive(Serialize)]
#[serde(transparent)]
struct RunOutput(RunSummary);

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        let summary = &self.0;
        format!(
            "Stored {} ({} partial), failed {}, not attempted {}",
            summary.stored_count(),
            summary.partial_count(),
            summary.failed_count(),
            summary.pending_count()
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.0).unwrap_or_default()
    }
}

/// Collect every date in the range, then print the run summary
///
/// Returns an error only when setup fails or the run stops on a fatal store
/// error. Failed days are reported in the summary.
pub async fn execute(args: RunArgs, config: Config, json_mode: bool) -> Result<()> {
    let (range, delay) = args.resolve(&config);

    if range.is_empty() {
        info!(start = %range.start(), end = %range.end(), "Start date is after end date; nothing to do");
        if !json_mode {
            println!("Nothing to do: {} is after {}", range.start(), range.end());
        }
        return Ok(());
    }

    let prompts = PromptBuilder::from_config(config.prompt.template_path.as_deref())?;
    let store = open_store(&config.database).await?;

    let browser: Arc<dyn BrowserAutomation> = match WebDriverClient::launch(&config.browser).await {
        Ok(client) => Arc::new(client),
        Err(err) => {
            store.close().await;
            return Err(err).context("Failed to start browser session");
        }
    };

    let session = InteractionSession::new(browser, prompts, SessionSettings::from_config(&config));

    let cancel = CancellationToken::new();
    let abort = CancellationToken::new();
    let interrupt = tokio::spawn(watch_interrupts(cancel.clone(), abort.clone()));

    let (event_tx, event_rx) = mpsc::channel::<RunEvent>(64);
    let reporter = tokio::spawn(ConsoleReporter::new(json_mode).run(event_rx));

    let summary = DayOrchestrator::new(session, store)
        .with_events(event_tx)
        .with_abort(abort)
        .run_range(range, delay, cancel)
        .await;

    interrupt.abort();
    let _ = reporter.await;

    let stop_reason = summary.stop_reason.clone();
    output(&RunOutput(summary), json_mode);

    match stop_reason {
        StopReason::Fatal(cause) => anyhow::bail!("Run stopped: {cause}"),
        StopReason::Completed | StopReason::Cancelled => Ok(()),
    }
}

/// First Ctrl-C stops after the current day; the second abandons it.
async fn watch_interrupts(cancel: CancellationToken, abort: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    warn!("Interrupt received; stopping after the current day (Ctrl-C again to abort it)");
    cancel.cancel();

    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("Second interrupt received; aborting the current day");
        abort.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_uses_config_defaults() {
        let mut config = Config::default();
        config.run.start_date = DateKey::from_ymd(2024, 1, 1).unwrap();
        config.run.end_date = DateKey::from_ymd(2024, 1, 3).unwrap();
        config.run.delay_between_days_secs = 7;

        let (range, delay) = RunArgs::default().resolve(&config);
        assert_eq!(range.len(), 3);
        assert_eq!(delay, Duration::from_secs(7));
    }

    #[test]
    fn test_resolve_applies_overrides() {
        let config = Config::default();
        let args = RunArgs {
            start: DateKey::from_ymd(2024, 2, 10),
            end: DateKey::from_ymd(2024, 2, 11),
            delay: Some(0),
        };
        let (range, delay) = args.resolve(&config);
        assert_eq!(range.start(), DateKey::from_ymd(2024, 2, 10).unwrap());
        assert_eq!(range.len(), 2);
        assert!(delay.is_zero());
    }
}
