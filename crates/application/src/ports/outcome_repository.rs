use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ferrous_analytics_domain::{
    CategoryCounts, DomainError, Granularity, OutcomeCategory, OutcomePage, OutcomeRecord,
    ReportFilter, StatusCount, TimeRange,
};
use tokio_util::sync::CancellationToken;

/// Records counted in one `(bucket, category)` cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketCount {
    pub bucket_start: DateTime<Utc>,
    pub category: OutcomeCategory,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LatencyBucket {
    pub bucket_start: DateTime<Utc>,
    pub avg_ms: f64,
    pub max_ms: u64,
    pub samples: u64,
}

/// Append-only store of raw outcome records.
///
/// Scans cover records whose timestamp falls in `[range.from, range.to)`.
#[async_trait]
pub trait OutcomeRepository: Send + Sync {
    async fn log_outcome(&self, record: &OutcomeRecord) -> Result<(), DomainError>;

    /// Newest records first. `cursor` is the id of the last record of the previous page.
    async fn get_page(
        &self,
        range: &TimeRange,
        filter: &ReportFilter,
        limit: u32,
        cursor: Option<i64>,
    ) -> Result<OutcomePage, DomainError>;

    async fn count_by_bucket(
        &self,
        range: &TimeRange,
        granularity: Granularity,
        filter: &ReportFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<BucketCount>, DomainError>;

    async fn count_by_category(
        &self,
        range: &TimeRange,
        filter: &ReportFilter,
        cancel: &CancellationToken,
    ) -> Result<CategoryCounts, DomainError>;

    async fn latency_by_bucket(
        &self,
        range: &TimeRange,
        granularity: Granularity,
        cancel: &CancellationToken,
    ) -> Result<Vec<LatencyBucket>, DomainError>;

    async fn status_distribution(
        &self,
        range: &TimeRange,
        cancel: &CancellationToken,
    ) -> Result<Vec<StatusCount>, DomainError>;
}
