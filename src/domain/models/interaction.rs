//! Interaction outcome and stored record models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::date_key::DateKey;

/// How the answer text was obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// The stream went quiet for the stability window.
    #[default]
    Stable,
    /// The wait ceiling was reached; the text may be truncated.
    Partial,
}

impl Completion {
    /// Storage and display form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Partial => "partial",
        }
    }

    /// Parse the storage form, case-insensitively
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "stable" => Some(Self::Stable),
            "partial" => Some(Self::Partial),
            _ => None,
        }
    }
}

/// Identifier of a stored document. Stable across re-upserts of the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredId(Uuid);

impl StoredId {
    /// Fresh random id for a date stored for the first time
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an id read back from the store
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for StoredId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StoredId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Result of one successful interaction, before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionOutcome {
    /// Prompt text as submitted
    pub prompt: String,
    /// Collected answer, never empty
    pub answer: String,
    /// How polling ended
    pub completion: Completion,
}

/// One day's prompt and answer, keyed by date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Date this interaction covers
    pub date: DateKey,
    /// Exact prompt text submitted
    pub prompt: String,
    /// Collected answer text
    pub answer: String,
    /// Whether the answer settled or was cut at the ceiling
    pub completion: Completion,
    /// When the answer was collected
    pub recorded_at: DateTime<Utc>,
}

impl InteractionRecord {
    /// Create a record from a finished interaction, stamped now.
    pub fn new(date: DateKey, outcome: InteractionOutcome) -> Self {
        Self {
            date,
            prompt: outcome.prompt,
            answer: outcome.answer,
            completion: outcome.completion,
            recorded_at: Utc::now(),
        }
    }

    /// True when the answer was cut at the ceiling
    pub fn is_partial(&self) -> bool {
        self.completion == Completion::Partial
    }
}

/// A record as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Row id, assigned on first insert
    pub id: StoredId,
    /// When this date was first stored; survives overwrites
    pub created_at: DateTime<Utc>,
    /// Latest content for the date
    #[serde(flatten)]
    pub record: InteractionRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_round_trip() {
        for c in [Completion::Stable, Completion::Partial] {
            assert_eq!(Completion::from_str(c.as_str()), Some(c));
        }
        assert_eq!(Completion::from_str("PARTIAL"), Some(Completion::Partial));
        assert_eq!(Completion::from_str("done"), None);
    }

    #[test]
    fn test_completion_defaults_to_stable() {
        assert_eq!(Completion::default(), Completion::Stable);
    }

    #[test]
    fn test_record_from_outcome() {
        let date = DateKey::from_ymd(2024, 1, 1).unwrap();
        let record = InteractionRecord::new(
            date,
            InteractionOutcome {
                prompt: "p".into(),
                answer: "a".into(),
                completion: Completion::Partial,
            },
        );
        assert_eq!(record.date, date);
        assert!(record.is_partial());
    }
}
