use super::metrics::CacheStats;
use super::single_flight::{EvictionEvent, SingleFlightCache};
use crate::ports::{CacheInvalidator, ReportRepository};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use ferrous_analytics_domain::{
    AnalyticsConfig, DomainError, Granularity, ReportFilter, ReportResult, ReportSource,
    TimeRange,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// TTL for windows touching the present or no longer than an hour.
pub const RECENT_WINDOW_TTL: Duration = Duration::from_secs(30);

/// Identity of a cached report.
///
/// The request is widened to whole UTC days and keyed by the dates of that
/// window (`to` exclusive), so requests that differ only by time of day share
/// one entry. The cached report always covers [`ReportKey::window`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportKey {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub granularity: Granularity,
    pub filter: String,
}

impl ReportKey {
    pub fn new(range: &TimeRange, granularity: Granularity, filter: &ReportFilter) -> Self {
        Self {
            from: range.from.date_naive(),
            to: Granularity::Day.ceil(range.to).date_naive(),
            granularity,
            filter: filter.normalized(),
        }
    }

    /// Bucket-aligned range the report for this key is computed over.
    pub fn window(&self) -> TimeRange {
        let days = TimeRange {
            from: self.from.and_time(NaiveTime::MIN).and_utc(),
            to: self.to.and_time(NaiveTime::MIN).and_utc(),
        };
        self.granularity.span(&days)
    }
}

/// Source selection and TTL rules for report requests.
#[derive(Debug, Clone)]
pub struct ReportCachePolicy {
    pub recency_threshold: Duration,
    pub short_ttl: Duration,
    pub default_ttl: Duration,
    pub aggregated_granularities: Vec<Granularity>,
}

impl ReportCachePolicy {
    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self {
            recency_threshold: config.recency_threshold(),
            short_ttl: config.short_cache_ttl(),
            default_ttl: config.default_cache_ttl(),
            aggregated_granularities: config.aggregation_granularities.clone(),
        }
    }

    pub fn is_recent(&self, to: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let threshold =
            chrono::Duration::from_std(self.recency_threshold).unwrap_or(chrono::Duration::MAX);
        now - to < threshold
    }

    /// Aggregates answer only unfiltered requests at a rolled-up granularity
    /// whose window ended before the recency threshold.
    pub fn select_source(
        &self,
        range: &TimeRange,
        granularity: Granularity,
        filter: &ReportFilter,
        now: DateTime<Utc>,
    ) -> ReportSource {
        if self.aggregated_granularities.contains(&granularity)
            && filter.is_empty()
            && !self.is_recent(range.to, now)
        {
            ReportSource::Aggregated
        } else {
            ReportSource::Raw
        }
    }

    pub fn ttl_for(&self, range: &TimeRange, now: DateTime<Utc>) -> Duration {
        let duration = range.duration();
        if self.is_recent(range.to, now) || duration <= chrono::Duration::hours(1) {
            RECENT_WINDOW_TTL
        } else if duration < chrono::Duration::days(1) {
            self.short_ttl
        } else {
            self.default_ttl
        }
    }
}

impl Default for ReportCachePolicy {
    fn default() -> Self {
        Self::from_config(&AnalyticsConfig::default())
    }
}

/// Single-flight cache of time-bucketed reports.
pub struct ReportCache {
    repository: Arc<dyn ReportRepository>,
    policy: ReportCachePolicy,
    cache: SingleFlightCache<ReportKey, ReportResult>,
}

impl ReportCache {
    pub fn new(repository: Arc<dyn ReportRepository>, policy: ReportCachePolicy) -> Self {
        Self {
            repository,
            policy,
            cache: SingleFlightCache::new("report"),
        }
    }

    /// Returns the report covering `[from, to)`, computing it at most once
    /// across concurrent callers with the same key.
    #[instrument(skip(self, filter, cancel), fields(filter = %filter))]
    pub async fn get(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        granularity: Granularity,
        filter: &ReportFilter,
        cancel: &CancellationToken,
    ) -> Result<Arc<ReportResult>, DomainError> {
        let requested = TimeRange::non_empty(from, to)?;
        let key = ReportKey::new(&requested, granularity, filter);
        let range = key.window();

        self.cache
            .get_or_compute(key, range, cancel, || async move {
                let source = self
                    .policy
                    .select_source(&range, granularity, filter, Utc::now());
                debug!(source = ?source, "Computing report");

                let report = match source {
                    ReportSource::Aggregated => {
                        self.repository
                            .aggregated_counts(&range, granularity, filter, cancel)
                            .await?
                    }
                    ReportSource::Raw => {
                        self.repository
                            .raw_counts(&range, granularity, filter, cancel)
                            .await?
                    }
                };

                Ok::<_, DomainError>((report, self.policy.ttl_for(&range, Utc::now())))
            })
            .await
    }

    /// Drops every cached report whose window overlaps `[from, to)`.
    pub fn invalidate(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> usize {
        match TimeRange::new(from, to) {
            Ok(range) => self.cache.invalidate(&range),
            Err(e) => {
                warn!(error = %e, "Ignoring report invalidation");
                0
            }
        }
    }

    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }

    pub fn peek(&self, key: &ReportKey) -> Option<Arc<ReportResult>> {
        self.cache.peek(key)
    }

    /// Range an invalidation must overlap to drop the entry under `key`.
    pub fn tracked_range(&self, key: &ReportKey) -> Option<TimeRange> {
        self.cache.tracked_range(key)
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

    pub fn subscribe(&self) -> broadcast::Receiver<EvictionEvent<ReportKey>> {
        self.cache.subscribe()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn policy(&self) -> &ReportCachePolicy {
        &self.policy
    }
}

impl CacheInvalidator for ReportCache {
    fn invalidate(&self, range: &TimeRange) -> usize {
        self.cache.invalidate(range)
    }
}
