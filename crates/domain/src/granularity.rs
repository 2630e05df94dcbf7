use crate::{DomainError, TimeRange};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bucket width used when counting outcomes over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
    Month,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [Granularity::Hour, Granularity::Day, Granularity::Month];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Month => "month",
        }
    }

    /// `strftime` pattern used to render time slot labels.
    pub fn label_format(&self) -> &'static str {
        match self {
            Granularity::Hour => "%Y-%m-%d %H:00",
            Granularity::Day => "%Y-%m-%d",
            Granularity::Month => "%Y-%m",
        }
    }

    pub fn label(&self, bucket_start: DateTime<Utc>) -> String {
        bucket_start.format(self.label_format()).to_string()
    }

    /// Start of the bucket containing `ts`.
    pub fn bucket_start(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let date = ts.date_naive();
        match self {
            Granularity::Hour => midnight(date) + Duration::hours(ts.hour() as i64),
            Granularity::Day => midnight(date),
            Granularity::Month => {
                midnight(NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date))
            }
        }
    }

    /// Start of the bucket following the one that starts at `bucket_start`.
    pub fn next_bucket(&self, bucket_start: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Granularity::Hour => bucket_start + Duration::hours(1),
            Granularity::Day => bucket_start + Duration::days(1),
            Granularity::Month => bucket_start
                .checked_add_months(Months::new(1))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// First bucket boundary at or after `ts`.
    pub fn ceil(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let start = self.bucket_start(ts);
        if start == ts {
            ts
        } else {
            self.next_bucket(start)
        }
    }

    /// Bucket-aligned range covering `range`.
    ///
    /// A degenerate range (`from == to`) covers the single bucket containing `from`.
    pub fn span(&self, range: &TimeRange) -> TimeRange {
        let from = self.bucket_start(range.from);
        let mut to = self.ceil(range.to);
        if to <= from {
            to = self.next_bucket(from);
        }
        TimeRange { from, to }
    }

    /// Starts of every bucket in the span of `range`, in ascending order.
    pub fn bucket_starts(&self, range: &TimeRange) -> Vec<DateTime<Utc>> {
        let span = self.span(range);
        let mut starts = Vec::new();
        let mut cursor = span.from;
        while cursor < span.to {
            starts.push(cursor);
            cursor = self.next_bucket(cursor);
        }
        starts
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" | "hourly" | "h" => Ok(Granularity::Hour),
            "day" | "daily" | "d" => Ok(Granularity::Day),
            "month" | "monthly" | "m" => Ok(Granularity::Month),
            other => Err(DomainError::InvalidGranularity(other.to_string())),
        }
    }
}
