//! Calendar date keys and inclusive date ranges.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ISO_FORMAT: &str = "%Y-%m-%d";

/// Error parsing a `YYYY-MM-DD` date key.
#[derive(Debug, Clone, Error)]
#[error("Invalid date '{input}': expected YYYY-MM-DD")]
pub struct DateKeyParseError {
    input: String,
}

/// A calendar date identifying one interaction and its stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Build a key from year, month and day. Returns None for impossible dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Today's date in UTC.
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }

    /// Underlying calendar date
    pub const fn date(&self) -> NaiveDate {
        self.0
    }

    /// The following calendar day, if representable.
    pub fn succ(&self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }

    /// Render with a chrono format string.
    pub fn format(&self, fmt: &str) -> String {
        self.0.format(fmt).to_string()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(ISO_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = DateKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), ISO_FORMAT)
            .map(Self)
            .map_err(|_| DateKeyParseError {
                input: s.to_string(),
            })
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

/// Inclusive range of date keys, iterated in ascending order.
///
/// A range whose start is after its end is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: DateKey,
    end: DateKey,
}

impl DateRange {
    /// Range from `start` to `end`, both inclusive. Not validated; a
    /// reversed range is simply empty.
    pub const fn new(start: DateKey, end: DateKey) -> Self {
        Self { start, end }
    }

    /// A range covering exactly one day.
    pub const fn single(date: DateKey) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// First date
    pub const fn start(&self) -> DateKey {
        self.start
    }

    /// Last date, inclusive
    pub const fn end(&self) -> DateKey {
        self.end
    }

    /// True when start is after end
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Number of days in the range.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let days = (self.end.0 - self.start.0).num_days();
        usize::try_from(days).unwrap_or(0) + 1
    }

    /// True when `date` falls inside the range
    pub fn contains(&self, date: DateKey) -> bool {
        self.start <= date && date <= self.end
    }

    /// Dates from start to end, ascending
    pub fn iter(&self) -> DateRangeIter {
        DateRangeIter {
            next: (!self.is_empty()).then_some(self.start),
            end: self.end,
        }
    }
}

impl IntoIterator for &DateRange {
    type Item = DateKey;
    type IntoIter = DateRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending iterator over a [`DateRange`].
#[derive(Debug, Clone)]
pub struct DateRangeIter {
    next: Option<DateKey>,
    end: DateKey,
}

impl Iterator for DateRangeIter {
    type Item = DateKey;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.succ().filter(|d| *d <= self.end);
        Some(current)
    }
}
