use async_trait::async_trait;
use ferrous_analytics_domain::{DomainError, Granularity, ReportFilter, ReportResult, TimeRange};
use tokio_util::sync::CancellationToken;

/// Answers a report either from raw records or from precomputed aggregates.
///
/// Both entry points return the same shape: every bucket in the span of
/// `range` is present, empty ones with zero counts.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn raw_counts(
        &self,
        range: &TimeRange,
        granularity: Granularity,
        filter: &ReportFilter,
        cancel: &CancellationToken,
    ) -> Result<ReportResult, DomainError>;

    /// Only valid for an empty filter; aggregates carry no filter dimension.
    async fn aggregated_counts(
        &self,
        range: &TimeRange,
        granularity: Granularity,
        filter: &ReportFilter,
        cancel: &CancellationToken,
    ) -> Result<ReportResult, DomainError>;
}
