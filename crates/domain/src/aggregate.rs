use crate::{Granularity, OutcomeCategory};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Precomputed count for one `(bucket_start, granularity, category)` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRow {
    pub bucket_start: DateTime<Utc>,
    pub granularity: Granularity,
    pub category: OutcomeCategory,
    pub count: u64,
    pub last_updated: DateTime<Utc>,
}
