#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ferrous_analytics_application::ports::{
    AggregateRepository, BucketCount, CacheCompactionOutcome, CacheMaintenancePort,
    LatencyBucket, OutcomeRepository,
};
use ferrous_analytics_domain::{
    AggregateRow, CategoryCounts, DomainError, Granularity, OutcomeCategory, OutcomePage,
    OutcomeRecord, ReportFilter, StatusCount, TimeRange,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Reports one successful request in every bucket it is asked about.
pub struct MockOutcomeRepository {
    scan_count: Arc<AtomicU64>,
    delay: Arc<RwLock<Option<Duration>>>,
}

impl MockOutcomeRepository {
    pub fn new() -> Self {
        Self {
            scan_count: Arc::new(AtomicU64::new(0)),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    pub fn scan_count(&self) -> u64 {
        self.scan_count.load(Ordering::Relaxed)
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }
}

#[async_trait]
impl OutcomeRepository for MockOutcomeRepository {
    async fn log_outcome(&self, _record: &OutcomeRecord) -> Result<(), DomainError> {
        Ok(())
    }

    async fn get_page(
        &self,
        _range: &TimeRange,
        _filter: &ReportFilter,
        _limit: u32,
        _cursor: Option<i64>,
    ) -> Result<OutcomePage, DomainError> {
        Ok(OutcomePage::default())
    }

    async fn count_by_bucket(
        &self,
        range: &TimeRange,
        _granularity: Granularity,
        _filter: &ReportFilter,
        _cancel: &CancellationToken,
    ) -> Result<Vec<BucketCount>, DomainError> {
        self.scan_count.fetch_add(1, Ordering::Relaxed);
        if let Some(delay) = *self.delay.read().await {
            tokio::time::sleep(delay).await;
        }
        Ok(vec![BucketCount {
            bucket_start: range.from,
            category: OutcomeCategory::Success,
            count: 1,
        }])
    }

    async fn count_by_category(
        &self,
        _range: &TimeRange,
        _filter: &ReportFilter,
        _cancel: &CancellationToken,
    ) -> Result<CategoryCounts, DomainError> {
        Ok(CategoryCounts::default())
    }

    async fn latency_by_bucket(
        &self,
        _range: &TimeRange,
        _granularity: Granularity,
        _cancel: &CancellationToken,
    ) -> Result<Vec<LatencyBucket>, DomainError> {
        Ok(Vec::new())
    }

    async fn status_distribution(
        &self,
        _range: &TimeRange,
        _cancel: &CancellationToken,
    ) -> Result<Vec<StatusCount>, DomainError> {
        Ok(Vec::new())
    }
}

pub struct MockAggregateRepository {
    upsert_count: Arc<AtomicU64>,
}

impl MockAggregateRepository {
    pub fn new() -> Self {
        Self {
            upsert_count: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn upsert_count(&self) -> u64 {
        self.upsert_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AggregateRepository for MockAggregateRepository {
    async fn upsert(
        &self,
        _bucket_start: DateTime<Utc>,
        _granularity: Granularity,
        _counts: &CategoryCounts,
    ) -> Result<u64, DomainError> {
        self.upsert_count.fetch_add(1, Ordering::Relaxed);
        Ok(0)
    }

    async fn rows_in_range(
        &self,
        _range: &TimeRange,
        _granularity: Granularity,
        _cancel: &CancellationToken,
    ) -> Result<Vec<AggregateRow>, DomainError> {
        Ok(Vec::new())
    }
}

pub struct MockCacheMaintenancePort {
    compaction_call_count: Arc<AtomicU64>,
    should_fail_compaction: Arc<RwLock<bool>>,
    compaction_outcome: Arc<RwLock<CacheCompactionOutcome>>,
}

impl MockCacheMaintenancePort {
    pub fn new() -> Self {
        Self {
            compaction_call_count: Arc::new(AtomicU64::new(0)),
            should_fail_compaction: Arc::new(RwLock::new(false)),
            compaction_outcome: Arc::new(RwLock::new(CacheCompactionOutcome::default())),
        }
    }

    pub fn with_compaction_outcome(mut self, outcome: CacheCompactionOutcome) -> Self {
        self.compaction_outcome = Arc::new(RwLock::new(outcome));
        self
    }

    pub fn compaction_call_count(&self) -> u64 {
        self.compaction_call_count.load(Ordering::Relaxed)
    }

    pub async fn set_should_fail_compaction(&self, fail: bool) {
        *self.should_fail_compaction.write().await = fail;
    }
}

#[async_trait]
impl CacheMaintenancePort for MockCacheMaintenancePort {
    async fn run_compaction_cycle(&self) -> Result<CacheCompactionOutcome, DomainError> {
        self.compaction_call_count.fetch_add(1, Ordering::Relaxed);
        if *self.should_fail_compaction.read().await {
            return Err(DomainError::DatabaseError("mock compaction failure".into()));
        }
        Ok(self.compaction_outcome.read().await.clone())
    }
}
