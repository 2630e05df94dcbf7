use crate::ports::{CacheInvalidator, OutcomeRepository};
use chrono::Utc;
use ferrous_analytics_domain::{AnalyticsConfig, DomainError, Granularity, OutcomeRecord, TimeRange};
use std::sync::Arc;
use tracing::debug;

/// Write sink for outcome records.
///
/// Records arriving later than the recency threshold land in buckets that
/// cached reports may already cover, so the hour around them is invalidated.
pub struct RecordOutcomeUseCase {
    repository: Arc<dyn OutcomeRepository>,
    invalidators: Vec<Arc<dyn CacheInvalidator>>,
    recency_threshold: chrono::Duration,
}

impl RecordOutcomeUseCase {
    pub fn new(repository: Arc<dyn OutcomeRepository>, config: &AnalyticsConfig) -> Self {
        Self {
            repository,
            invalidators: Vec::new(),
            recency_threshold: chrono::Duration::minutes(config.recency_threshold_minutes as i64),
        }
    }

    pub fn with_invalidator(mut self, invalidator: Arc<dyn CacheInvalidator>) -> Self {
        self.invalidators.push(invalidator);
        self
    }

    pub async fn execute(&self, record: &OutcomeRecord) -> Result<(), DomainError> {
        self.repository.log_outcome(record).await?;

        if Utc::now() - record.timestamp >= self.recency_threshold {
            let start = Granularity::Hour.bucket_start(record.timestamp);
            let bucket = TimeRange {
                from: start,
                to: Granularity::Hour.next_bucket(start),
            };
            let invalidated: usize = self
                .invalidators
                .iter()
                .map(|invalidator| invalidator.invalidate(&bucket))
                .sum();
            debug!(bucket = %bucket, invalidated, "Late outcome record invalidated cached reports");
        }

        Ok(())
    }
}
