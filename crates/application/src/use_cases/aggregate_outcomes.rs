use crate::ports::{AggregateRepository, CacheInvalidator, OutcomeRepository};
use chrono::{DateTime, Utc};
use ferrous_analytics_domain::{
    AnalyticsConfig, CategoryCounts, DomainError, Granularity, ReportFilter, TimeRange,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Summary of one aggregation sweep.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AggregationOutcome {
    pub buckets_processed: u64,
    pub buckets_failed: u64,
    pub rows_changed: u64,
    /// Buckets whose stored counts changed during this sweep.
    pub changed_ranges: Vec<TimeRange>,
    /// The sweep stopped early because shutdown was requested.
    pub cancelled: bool,
}

/// Recomputes aggregate rows for every bucket in the sweep window.
pub struct AggregateOutcomesUseCase {
    outcomes: Arc<dyn OutcomeRepository>,
    aggregates: Arc<dyn AggregateRepository>,
    invalidators: Vec<Arc<dyn CacheInvalidator>>,
    granularities: Vec<Granularity>,
    lookback: chrono::Duration,
    safety_margin: chrono::Duration,
}

impl AggregateOutcomesUseCase {
    pub fn new(
        outcomes: Arc<dyn OutcomeRepository>,
        aggregates: Arc<dyn AggregateRepository>,
        config: &AnalyticsConfig,
    ) -> Self {
        Self {
            outcomes,
            aggregates,
            invalidators: Vec::new(),
            granularities: config.aggregation_granularities.clone(),
            lookback: chrono::Duration::days(config.aggregation_lookback_days as i64),
            safety_margin: chrono::Duration::minutes(
                config.aggregation_safety_margin_minutes as i64,
            ),
        }
    }

    pub fn with_invalidator(mut self, invalidator: Arc<dyn CacheInvalidator>) -> Self {
        self.invalidators.push(invalidator);
        self
    }

    /// `[now - lookback, now - safety_margin]`.
    pub fn window(&self, now: DateTime<Utc>) -> Result<TimeRange, DomainError> {
        TimeRange::new(now - self.lookback, now - self.safety_margin)
    }

    pub async fn execute(
        &self,
        cancel: &CancellationToken,
    ) -> Result<AggregationOutcome, DomainError> {
        self.execute_at(Utc::now(), cancel).await
    }

    /// Sweeps the window ending at `now`. A failing bucket is logged and
    /// skipped; cancellation is honoured between buckets.
    pub async fn execute_at(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<AggregationOutcome, DomainError> {
        let window = self.window(now)?;
        let mut outcome = AggregationOutcome::default();

        'sweep: for &granularity in &self.granularities {
            for bucket_start in granularity.bucket_starts(&window) {
                if cancel.is_cancelled() {
                    outcome.cancelled = true;
                    break 'sweep;
                }

                let bucket = TimeRange {
                    from: bucket_start,
                    to: granularity.next_bucket(bucket_start),
                };

                match self.aggregate_bucket(&bucket, granularity, cancel).await {
                    Ok(changed) => {
                        outcome.buckets_processed += 1;
                        outcome.rows_changed += changed;
                        if changed > 0 {
                            outcome.changed_ranges.push(bucket);
                        }
                    }
                    Err(DomainError::Cancelled) => {
                        outcome.cancelled = true;
                        break 'sweep;
                    }
                    Err(e) => {
                        outcome.buckets_failed += 1;
                        warn!(
                            bucket = %granularity.label(bucket_start),
                            granularity = %granularity,
                            error = %e,
                            "Failed to aggregate bucket"
                        );
                    }
                }
            }
        }

        let invalidated = self.invalidate(&outcome.changed_ranges);

        info!(
            window = %window,
            processed = outcome.buckets_processed,
            failed = outcome.buckets_failed,
            rows_changed = outcome.rows_changed,
            invalidated,
            cancelled = outcome.cancelled,
            "Aggregation sweep finished"
        );

        Ok(outcome)
    }

    async fn aggregate_bucket(
        &self,
        bucket: &TimeRange,
        granularity: Granularity,
        cancel: &CancellationToken,
    ) -> Result<u64, DomainError> {
        let cells = self
            .outcomes
            .count_by_bucket(bucket, granularity, &ReportFilter::empty(), cancel)
            .await?;
        let counts: CategoryCounts = cells
            .into_iter()
            .map(|cell| (cell.category, cell.count))
            .collect();

        let changed = self
            .aggregates
            .upsert(bucket.from, granularity, &counts)
            .await?;
        if changed > 0 {
            debug!(
                bucket = %granularity.label(bucket.from),
                granularity = %granularity,
                total = counts.total(),
                changed,
                "Aggregate bucket updated"
            );
        }
        Ok(changed)
    }

    fn invalidate(&self, ranges: &[TimeRange]) -> usize {
        ranges
            .iter()
            .map(|range| {
                self.invalidators
                    .iter()
                    .map(|invalidator| invalidator.invalidate(range))
                    .sum::<usize>()
            })
            .sum()
    }
}
