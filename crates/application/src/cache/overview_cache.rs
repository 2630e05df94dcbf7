use super::metrics::CacheStats;
use super::overview_window::{normalize_window, NormalizedWindow};
use super::single_flight::{EvictionEvent, SingleFlightCache};
use crate::ports::{CacheInvalidator, LatencyBucket, NodeHealthRepository, OutcomeRepository};
use chrono::{DateTime, Utc};
use ferrous_analytics_domain::{
    DomainError, LatencyPoint, OverviewResult, ReportFilter, ReportResult, ReportSource,
    TimeRange,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Single-flight cache of dashboard overviews keyed by normalized window.
pub struct OverviewCache {
    outcomes: Arc<dyn OutcomeRepository>,
    nodes: Arc<dyn NodeHealthRepository>,
    cache: SingleFlightCache<TimeRange, OverviewResult>,
}

impl OverviewCache {
    pub fn new(outcomes: Arc<dyn OutcomeRepository>, nodes: Arc<dyn NodeHealthRepository>) -> Self {
        Self {
            outcomes,
            nodes,
            cache: SingleFlightCache::new("overview"),
        }
    }

    #[instrument(skip(self, cancel))]
    pub async fn get(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Arc<OverviewResult>, DomainError> {
        let requested = TimeRange::non_empty(from, to)?;
        let window = normalize_window(&requested, Utc::now());

        self.cache
            .get_or_compute(window.range, window.range, cancel, || async move {
                let overview = self.compute(&window, cancel).await?;
                Ok::<_, DomainError>((overview, window.ttl))
            })
            .await
    }

    /// Runs every sub-query concurrently; the first failure fails the overview.
    async fn compute(
        &self,
        window: &NormalizedWindow,
        cancel: &CancellationToken,
    ) -> Result<OverviewResult, DomainError> {
        let range = window.range;
        let granularity = window.timeline;
        let filter = ReportFilter::empty();

        let (totals, buckets, latency, status_distribution, node_health) = tokio::try_join!(
            self.outcomes.count_by_category(&range, &filter, cancel),
            self.outcomes
                .count_by_bucket(&range, granularity, &filter, cancel),
            self.outcomes.latency_by_bucket(&range, granularity, cancel),
            self.outcomes.status_distribution(&range, cancel),
            self.nodes.count_health(cancel),
        )?;

        let timeline = ReportResult::from_bucket_counts(
            &range,
            granularity,
            buckets
                .into_iter()
                .map(|b| (b.bucket_start, b.category, b.count)),
            ReportSource::Raw,
        )
        .into_slots();

        let mut latency_by_start: HashMap<DateTime<Utc>, LatencyBucket> = latency
            .into_iter()
            .map(|b| (b.bucket_start, b))
            .collect();
        let latency_timeline = granularity
            .bucket_starts(&range)
            .into_iter()
            .map(|start| {
                let bucket = latency_by_start.remove(&start);
                LatencyPoint {
                    start,
                    label: granularity.label(start),
                    avg_ms: bucket.as_ref().map_or(0.0, |b| b.avg_ms),
                    max_ms: bucket.as_ref().map_or(0, |b| b.max_ms),
                    samples: bucket.as_ref().map_or(0, |b| b.samples),
                }
            })
            .collect();

        debug!(
            total = totals.total(),
            slots = timeline.len(),
            nodes = node_health.total(),
            "Overview computed"
        );

        Ok(OverviewResult {
            range,
            timeline_granularity: granularity,
            totals,
            timeline,
            latency_timeline,
            status_distribution,
            node_health,
            generated_at: Utc::now(),
        })
    }

    /// Drops every cached overview whose normalized window overlaps `[from, to)`.
    pub fn invalidate(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> usize {
        match TimeRange::new(from, to) {
            Ok(range) => self.cache.invalidate(&range),
            Err(e) => {
                warn!(error = %e, "Ignoring overview invalidation");
                0
            }
        }
    }

    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn slot_count(&self) -> usize {
        self.cache.slot_count()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EvictionEvent<TimeRange>> {
        self.cache.subscribe()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl CacheInvalidator for OverviewCache {
    fn invalidate(&self, range: &TimeRange) -> usize {
        self.cache.invalidate(range)
    }
}
