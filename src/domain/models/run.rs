//! Per-day reports and the summary of a whole run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::date_key::{DateKey, DateRange};
use super::interaction::{Completion, StoredId};

/// Lifecycle of one date within a run. There is no retry transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    /// Not attempted (yet, or ever if the run stopped early)
    Pending,
    /// Interaction under way
    InProgress,
    /// Answer persisted
    Stored,
    /// Interaction or persistence failed
    Failed,
}

impl DayStatus {
    /// Lowercase name used in logs and table output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Stored => "stored",
            Self::Failed => "failed",
        }
    }

    /// Stored and Failed are final within a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stored | Self::Failed)
    }
}

/// Final state of one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayReport {
    /// Date this report covers
    pub date: DateKey,
    /// Where the date ended up
    pub status: DayStatus,
    /// Row id of the stored record
    ///
    /// Set only when `status` is `Stored`. A rerun of the same date returns
    /// the same id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_id: Option<StoredId>,
    /// Whether the stored answer settled or was cut off at the ceiling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<Completion>,
    /// Failure cause, set only when `status` is `Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DayReport {
    /// Report for an answer that was persisted under `id`
    pub fn stored(date: DateKey, id: StoredId, completion: Completion) -> Self {
        Self {
            date,
            status: DayStatus::Stored,
            stored_id: Some(id),
            completion: Some(completion),
            error: None,
        }
    }

    /// Report for a date that failed with `cause`
    pub fn failed(date: DateKey, cause: impl Into<String>) -> Self {
        Self {
            date,
            status: DayStatus::Failed,
            stored_id: None,
            completion: None,
            error: Some(cause.into()),
        }
    }

    /// Report for a date not attempted
    pub fn pending(date: DateKey) -> Self {
        Self {
            date,
            status: DayStatus::Pending,
            stored_id: None,
            completion: None,
            error: None,
        }
    }

    /// True when the stored answer hit the wait ceiling before settling
    pub fn is_partial(&self) -> bool {
        self.completion == Some(Completion::Partial)
    }
}

/// Why the run stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "cause", rename_all = "snake_case")]
pub enum StopReason {
    /// Every date was attempted
    Completed,
    /// Operator interrupt
    Cancelled,
    /// Unrecoverable fault such as a lost store connection
    Fatal(String),
}

/// Outcome of releasing the run's external resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownReport {
    /// The browser session was ended without error
    pub browser_closed: bool,
    /// The store pool was closed
    pub store_closed: bool,
    /// Errors hit while releasing resources. These never fail the run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Everything that happened in one run, one report per date in the range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Requested range, inclusive
    pub range: DateRange,
    /// One report per date in ascending order
    ///
    /// Dates after an early stop stay `Pending`.
    pub days: Vec<DayReport>,
    /// Why no further dates were attempted
    pub stop_reason: StopReason,
    /// How browser and store release went
    pub teardown: TeardownReport,
    /// When the run began
    pub started_at: DateTime<Utc>,
    /// When teardown finished
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    fn count(&self, status: DayStatus) -> usize {
        self.days.iter().filter(|d| d.status == status).count()
    }

    /// Number of dates with a persisted answer
    pub fn stored_count(&self) -> usize {
        self.count(DayStatus::Stored)
    }

    /// Number of dates that failed
    pub fn failed_count(&self) -> usize {
        self.count(DayStatus::Failed)
    }

    /// Number of dates never attempted
    pub fn pending_count(&self) -> usize {
        self.count(DayStatus::Pending)
    }

    /// Number of stored answers that were cut off at the ceiling
    pub fn partial_count(&self) -> usize {
        self.days.iter().filter(|d| d.is_partial()).count()
    }

    /// Report for `date`, if it lies inside the range
    pub fn report_for(&self, date: DateKey) -> Option<&DayReport> {
        self.days.iter().find(|d| d.date == date)
    }
}
