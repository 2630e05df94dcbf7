use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ferrous_analytics_domain::{AggregateRow, CategoryCounts, DomainError, Granularity, TimeRange};
use tokio_util::sync::CancellationToken;

/// Precomputed `(bucket_start, granularity, category) -> count` table.
#[async_trait]
pub trait AggregateRepository: Send + Sync {
    /// Replaces the counts of every category for one bucket, zeros included.
    ///
    /// Returns the number of rows whose count changed (inserted rows count as changed).
    async fn upsert(
        &self,
        bucket_start: DateTime<Utc>,
        granularity: Granularity,
        counts: &CategoryCounts,
    ) -> Result<u64, DomainError>;

    /// Rows whose `bucket_start` falls in `[range.from, range.to)`.
    async fn rows_in_range(
        &self,
        range: &TimeRange,
        granularity: Granularity,
        cancel: &CancellationToken,
    ) -> Result<Vec<AggregateRow>, DomainError>;
}
