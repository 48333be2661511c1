//! Day Orchestrator
//!
//! Walks a date range in ascending order, one interaction per date, and
//! persists each successful answer keyed by its date.
//!
//! Per-date states run `Pending -> InProgress -> Stored | Failed` with no
//! retry. A day that fails (including by panicking) is logged and skipped.
//! A store failure is fatal and stops the range. Cancellation is observed
//! between days and during the inter-day delay. A separate abort token, when
//! set with [`DayOrchestrator::with_abort`], also interrupts the day in
//! flight.
//!
//! The orchestrator owns the browser session and the store for the whole run
//! and [`DayOrchestrator::run_range`] consumes it, so both are released
//! exactly once whichever way the run ends.

use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::application::interaction_session::InteractionSession;
use crate::domain::errors::InteractionError;
use crate::domain::models::{
    DateKey, DateRange, DayReport, DayStatus, InteractionRecord, RunSummary, StopReason,
    TeardownReport,
};
use crate::domain::ports::InteractionStore;

/// Progress notifications for a run, in the order they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// The run is about to start `total` dates
    Started {
        /// Requested range
        range: DateRange,
        /// Number of dates in it
        total: usize,
    },
    /// Interaction for a date began
    DayStarted {
        /// Date being attempted
        date: DateKey,
        /// Zero-based position in the range
        index: usize,
        /// Number of dates in the range
        total: usize,
    },
    /// A date reached its final state
    DayFinished(DayReport),
    /// Pausing before the next date
    Waiting {
        /// Date attempted after the pause
        next: DateKey,
        /// Length of the pause
        delay: Duration,
    },
    /// No further dates will be attempted
    Stopped(StopReason),
    /// Browser and store have been released
    TornDown(TeardownReport),
}

/// Cause reported for a day interrupted by the abort token.
const ABORTED_CAUSE: &str = "interrupted by operator";

/// Result of one date. A stop reason ends the range after this date.
struct DayResult {
    report: DayReport,
    stop: Option<StopReason>,
}

impl DayResult {
    fn done(report: DayReport) -> Self {
        Self { report, stop: None }
    }
}

/// Sequential per-date driver.
pub struct DayOrchestrator {
    session: InteractionSession,
    store: Arc<dyn InteractionStore>,
    events: Option<mpsc::Sender<RunEvent>>,
    abort: CancellationToken,
}

impl DayOrchestrator {
    /// Orchestrator over an open session and store, with no events and an
    /// abort token that never trips
    pub fn new(session: InteractionSession, store: Arc<dyn InteractionStore>) -> Self {
        Self {
            session,
            store,
            events: None,
            abort: CancellationToken::new(),
        }
    }

    /// Publish [`RunEvent`]s to `tx` while running.
    #[must_use]
    pub fn with_events(mut self, tx: mpsc::Sender<RunEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Abandon the day in flight when `abort` trips. The day is reported as
    /// failed and the run stops as cancelled; teardown still runs.
    #[must_use]
    pub fn with_abort(mut self, abort: CancellationToken) -> Self {
        self.abort = abort;
        self
    }

    /// Process every date in `range`, then release the browser and the store.
    ///
    /// An empty range (start after end) performs no interaction and no write.
    #[instrument(skip(self, cancel), fields(start = %range.start(), end = %range.end()))]
    pub async fn run_range(
        self,
        range: DateRange,
        delay: Duration,
        cancel: CancellationToken,
    ) -> RunSummary {
        let started_at = Utc::now();
        let dates: Vec<DateKey> = range.iter().collect();
        let total = dates.len();
        let mut days: Vec<DayReport> = dates.iter().copied().map(DayReport::pending).collect();

        info!(start = %range.start(), end = %range.end(), total, "Starting run");
        self.emit(RunEvent::Started { range, total }).await;

        let mut stop_reason = StopReason::Completed;
        for (index, date) in dates.iter().copied().enumerate() {
            if cancel.is_cancelled() || self.abort.is_cancelled() {
                stop_reason = StopReason::Cancelled;
                break;
            }

            days[index].status = DayStatus::InProgress;
            self.emit(RunEvent::DayStarted { date, index, total }).await;

            let result = self.process_day(date).await;
            debug_assert!(result.report.status.is_terminal());
            debug!(date = %date, status = result.report.status.as_str(), "Day finished");
            days[index] = result.report.clone();
            self.emit(RunEvent::DayFinished(result.report)).await;

            if let Some(reason) = result.stop {
                stop_reason = reason;
                break;
            }

            let Some(next) = dates.get(index + 1).copied() else {
                break;
            };
            if !delay.is_zero() {
                self.emit(RunEvent::Waiting { next, delay }).await;
            }
            tokio::select! {
                () = cancel.cancelled() => {
                    stop_reason = StopReason::Cancelled;
                    break;
                }
                () = self.abort.cancelled() => {
                    stop_reason = StopReason::Cancelled;
                    break;
                }
                () = sleep(delay) => {}
            }
        }

        match &stop_reason {
            StopReason::Completed => info!("All dates attempted"),
            StopReason::Cancelled => warn!("Run cancelled"),
            StopReason::Fatal(cause) => error!(cause = %cause, "Run stopped on fatal error"),
        }
        self.emit(RunEvent::Stopped(stop_reason.clone())).await;

        let events = self.events.clone();
        let teardown = self.teardown().await;
        if let Some(tx) = events {
            let _ = tx.send(RunEvent::TornDown(teardown.clone())).await;
        }

        RunSummary {
            range,
            days,
            stop_reason,
            teardown,
            started_at,
            finished_at: Utc::now(),
        }
    }

    async fn process_day(&self, date: DateKey) -> DayResult {
        info!(date = %date, "Processing date");

        let interaction = AssertUnwindSafe(self.session.run(date)).catch_unwind();
        let attempt = tokio::select! {
            () = self.abort.cancelled() => None,
            attempt = interaction => Some(attempt),
        };

        let outcome = match attempt {
            None => {
                warn!(date = %date, "Day aborted");
                return DayResult {
                    report: DayReport::failed(date, ABORTED_CAUSE),
                    stop: Some(StopReason::Cancelled),
                };
            }
            Some(Ok(Ok(outcome))) => outcome,
            Some(Ok(Err(err))) => return day_failed(date, &err),
            Some(Err(payload)) => {
                let cause = format!("interaction panicked: {}", panic_message(payload.as_ref()));
                error!(date = %date, cause = %cause, "Day failed");
                return DayResult::done(DayReport::failed(date, cause));
            }
        };

        let record = InteractionRecord::new(date, outcome);
        match self.store.upsert(&record).await {
            Ok(id) => {
                info!(
                    date = %date,
                    id = %id,
                    completion = record.completion.as_str(),
                    "Stored"
                );
                DayResult::done(DayReport::stored(date, id, record.completion))
            }
            Err(err) => {
                let cause = format!("persistence failed: {err}");
                error!(date = %date, cause = %cause, "Day failed");
                DayResult {
                    report: DayReport::failed(date, cause.clone()),
                    stop: Some(StopReason::Fatal(cause)),
                }
            }
        }
    }

    /// Release the browser session, then the store. Failures are recorded,
    /// never propagated.
    async fn teardown(self) -> TeardownReport {
        let mut report = TeardownReport::default();

        match self.session.browser().close().await {
            Ok(()) => report.browser_closed = true,
            Err(err) => {
                warn!(error = %err, "Failed to close browser session");
                report.errors.push(format!("browser: {err}"));
            }
        }

        self.store.close().await;
        report.store_closed = true;

        info!(
            browser_closed = report.browser_closed,
            store_closed = report.store_closed,
            "Teardown complete"
        );
        report
    }

    async fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }
}

fn day_failed(date: DateKey, err: &InteractionError) -> DayResult {
    error!(date = %date, cause = %err, "Day failed");
    DayResult::done(DayReport::failed(date, err.to_string()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
