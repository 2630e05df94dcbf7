use crate::ports::{AggregateRepository, OutcomeRepository, ReportRepository};
use async_trait::async_trait;
use ferrous_analytics_domain::{
    DomainError, Granularity, ReportFilter, ReportResult, ReportSource, TimeRange,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Dual-mode report engine over the raw outcome store and the aggregate store.
pub struct StoreReportRepository {
    outcomes: Arc<dyn OutcomeRepository>,
    aggregates: Arc<dyn AggregateRepository>,
}

impl StoreReportRepository {
    pub fn new(
        outcomes: Arc<dyn OutcomeRepository>,
        aggregates: Arc<dyn AggregateRepository>,
    ) -> Self {
        Self {
            outcomes,
            aggregates,
        }
    }
}

#[async_trait]
impl ReportRepository for StoreReportRepository {
    #[instrument(skip_all, fields(range = %range, granularity = %granularity, filter = %filter))]
    async fn raw_counts(
        &self,
        range: &TimeRange,
        granularity: Granularity,
        filter: &ReportFilter,
        cancel: &CancellationToken,
    ) -> Result<ReportResult, DomainError> {
        let span = granularity.span(range);
        let buckets = self
            .outcomes
            .count_by_bucket(&span, granularity, filter, cancel)
            .await?;

        debug!(cells = buckets.len(), "Raw outcome scan completed");
        Ok(ReportResult::from_bucket_counts(
            range,
            granularity,
            buckets
                .into_iter()
                .map(|b| (b.bucket_start, b.category, b.count)),
            ReportSource::Raw,
        ))
    }

    #[instrument(skip_all, fields(range = %range, granularity = %granularity))]
    async fn aggregated_counts(
        &self,
        range: &TimeRange,
        granularity: Granularity,
        filter: &ReportFilter,
        cancel: &CancellationToken,
    ) -> Result<ReportResult, DomainError> {
        if !filter.is_empty() {
            return Err(DomainError::AggregatesUnavailable(format!(
                "filter '{}' is not aggregated",
                filter
            )));
        }

        let span = granularity.span(range);
        let rows = self
            .aggregates
            .rows_in_range(&span, granularity, cancel)
            .await?;

        debug!(rows = rows.len(), "Aggregate rows summed");
        Ok(ReportResult::from_bucket_counts(
            range,
            granularity,
            rows.into_iter()
                .map(|row| (row.bucket_start, row.category, row.count)),
            ReportSource::Aggregated,
        ))
    }
}
