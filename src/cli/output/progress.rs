//! Console progress for a run
//!
//! Renders [`RunEvent`]s as an indicatif bar over the date range plus one
//! line per finished day and a final teardown line.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::application::RunEvent;
use crate::domain::models::{DayReport, DayStatus, StopReason, TeardownReport};

const PROGRESS_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}";
const PROGRESS_CHARS: &str = "█▓▒░ ";

/// Progress bar over `total` days.
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(PROGRESS_CHARS);
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(200));
    pb
}

/// Console line for a finished day.
pub fn day_line(report: &DayReport) -> String {
    let date = report.date;
    match report.status {
        DayStatus::Stored => {
            let id = report
                .stored_id
                .map(|id| id.to_string())
                .unwrap_or_default();
            if report.is_partial() {
                format!(
                    "{} {date} stored (id={id}) {}",
                    style("⚠").yellow(),
                    style("partial answer").yellow()
                )
            } else {
                format!("{} {date} stored (id={id})", style("✓").green())
            }
        }
        DayStatus::Failed => format!(
            "{} {date} failed: {}",
            style("✗").red(),
            report.error.as_deref().unwrap_or("unknown error")
        ),
        DayStatus::Pending | DayStatus::InProgress => {
            format!("{} {date} not attempted", style("-").dim())
        }
    }
}

/// Console line describing why the run stopped.
pub fn stop_line(reason: &StopReason) -> String {
    match reason {
        StopReason::Completed => format!("{} all dates attempted", style("■").green()),
        StopReason::Cancelled => format!("{} cancelled by operator", style("■").yellow()),
        StopReason::Fatal(cause) => format!("{} stopped: {cause}", style("■").red()),
    }
}

/// Console line for the release of browser and store.
pub fn teardown_line(report: &TeardownReport) -> String {
    let flag = |closed: bool| if closed { "closed" } else { "NOT closed" };
    let mut line = format!(
        "Teardown: browser {}, store {}",
        flag(report.browser_closed),
        flag(report.store_closed)
    );
    if !report.errors.is_empty() {
        line.push_str(&format!(" ({})", report.errors.join("; ")));
    }
    line
}

/// Consumes run events and draws them. Silent in JSON mode.
pub struct ConsoleReporter {
    json_mode: bool,
    bar: Option<ProgressBar>,
}

impl ConsoleReporter {
    /// Reporter that draws nothing when `json_mode` is set
    pub fn new(json_mode: bool) -> Self {
        Self {
            json_mode,
            bar: None,
        }
    }

    /// Drain `rx` until every sender is dropped.
    pub async fn run(mut self, mut rx: mpsc::Receiver<RunEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle(&event);
        }
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    /// Draw one event
    pub fn handle(&mut self, event: &RunEvent) {
        if self.json_mode {
            return;
        }
        match event {
            RunEvent::Started { range, total } => {
                println!(
                    "Collecting {total} day(s) from {} to {}",
                    style(range.start()).bold(),
                    style(range.end()).bold()
                );
                self.bar = Some(create_progress_bar(*total as u64));
            }
            RunEvent::DayStarted { date, .. } => {
                if let Some(bar) = &self.bar {
                    bar.set_message(format!("{date}: waiting for answer"));
                }
            }
            RunEvent::DayFinished(report) => {
                self.println(&day_line(report));
                if let Some(bar) = &self.bar {
                    bar.inc(1);
                }
            }
            RunEvent::Waiting { next, delay } => {
                if let Some(bar) = &self.bar {
                    bar.set_message(format!("next: {next} in {}s", delay.as_secs()));
                }
            }
            RunEvent::Stopped(reason) => {
                if let Some(bar) = self.bar.take() {
                    bar.finish_and_clear();
                }
                println!("{}", stop_line(reason));
            }
            RunEvent::TornDown(report) => println!("{}", teardown_line(report)),
        }
    }

    fn println(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => println!("{line}"),
        }
    }
}
