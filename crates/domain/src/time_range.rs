use crate::DomainError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open time window `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    /// Builds a range, rejecting `to < from`. An empty range (`from == to`) is allowed.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, DomainError> {
        if to < from {
            return Err(DomainError::InvalidTimeRange(format!(
                "end {} is before start {}",
                to, from
            )));
        }
        Ok(Self { from, to })
    }

    /// Builds a range that must contain at least one instant (`to > from`).
    pub fn non_empty(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, DomainError> {
        if to <= from {
            return Err(DomainError::InvalidTimeRange(format!(
                "end {} must be after start {}",
                to, from
            )));
        }
        Ok(Self { from, to })
    }

    pub fn ending_at(to: DateTime<Utc>, length: Duration) -> Self {
        Self {
            from: to - length,
            to,
        }
    }

    pub fn duration(&self) -> Duration {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.to <= self.from
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.from && ts < self.to
    }

    /// Strict overlap: ranges that only touch at a boundary do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.from < other.to && other.from < self.to
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.from.format("%Y-%m-%d %H:%M:%S"),
            self.to.format("%Y-%m-%d %H:%M:%S")
        )
    }
}
