#![allow(dead_code)]
#![allow(unused_imports)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use ferrous_analytics_application::ports::{
    AggregateRepository, BucketCount, CacheInvalidator, LatencyBucket, NodeHealthRepository,
    OutcomeRepository, ReportRepository,
};
use ferrous_analytics_domain::{
    AggregateRow, CategoryCounts, DomainError, Granularity, NodeHealthCounts, OutcomeCategory,
    OutcomePage, OutcomeRecord, ReportFilter, ReportResult, ReportSource, StatusCount, TimeRange,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn record(at: DateTime<Utc>, status: Option<u16>) -> OutcomeRecord {
    OutcomeRecord::new(at, "/api/orders", "10.0.0.1", status)
}

// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MockOutcomeRepository {
    records: Arc<RwLock<Vec<OutcomeRecord>>>,
    next_id: Arc<AtomicU64>,
    failing_buckets: Arc<RwLock<HashSet<DateTime<Utc>>>>,
    should_fail: Arc<AtomicBool>,
    bucket_scans: Arc<AtomicUsize>,
    delay: Arc<RwLock<Option<Duration>>>,
}

impl MockOutcomeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<OutcomeRecord>) -> Self {
        let repo = Self::new();
        for record in records {
            repo.push(record);
        }
        repo
    }

    pub fn push(&self, mut record: OutcomeRecord) {
        record.id = Some(self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1);
        self.records.write().unwrap().push(record);
    }

    pub fn fail_bucket(&self, bucket_start: DateTime<Utc>) {
        self.failing_buckets.write().unwrap().insert(bucket_start);
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.write().unwrap() = Some(delay);
    }

    pub fn bucket_scans(&self) -> usize {
        self.bucket_scans.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    fn matching(&self, range: &TimeRange, filter: &ReportFilter) -> Vec<OutcomeRecord> {
        self.records
            .read()
            .unwrap()
            .iter()
            .filter(|r| range.contains(r.timestamp) && filter.matches(r))
            .cloned()
            .collect()
    }

    async fn pause(&self) {
        let delay = *self.delay.read().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_failure(&self) -> Result<(), DomainError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("mock outcome store failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl OutcomeRepository for MockOutcomeRepository {
    async fn log_outcome(&self, record: &OutcomeRecord) -> Result<(), DomainError> {
        self.check_failure()?;
        self.push(record.clone());
        Ok(())
    }

    async fn get_page(
        &self,
        range: &TimeRange,
        filter: &ReportFilter,
        limit: u32,
        cursor: Option<i64>,
    ) -> Result<OutcomePage, DomainError> {
        self.check_failure()?;
        let mut records: Vec<OutcomeRecord> = self
            .matching(range, filter)
            .into_iter()
            .filter(|r| cursor.is_none_or(|c| r.id.unwrap_or(0) < c))
            .collect();
        records.sort_by(|a, b| b.id.cmp(&a.id));
        let has_more = records.len() > limit as usize;
        records.truncate(limit as usize);

        let next_cursor = if has_more {
            records.last().and_then(|r| r.id)
        } else {
            None
        };
        Ok(OutcomePage {
            records,
            next_cursor,
        })
    }

    async fn count_by_bucket(
        &self,
        range: &TimeRange,
        granularity: Granularity,
        filter: &ReportFilter,
        _cancel: &CancellationToken,
    ) -> Result<Vec<BucketCount>, DomainError> {
        self.bucket_scans.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check_failure()?;
        if self.failing_buckets.read().unwrap().contains(&range.from) {
            return Err(DomainError::DatabaseError(format!(
                "mock failure for bucket {}",
                range.from
            )));
        }

        let mut cells: BTreeMap<(DateTime<Utc>, i64), u64> = BTreeMap::new();
        for r in self.matching(range, filter) {
            *cells
                .entry((granularity.bucket_start(r.timestamp), r.category().code()))
                .or_default() += 1;
        }
        Ok(cells
            .into_iter()
            .filter_map(|((bucket_start, code), count)| {
                OutcomeCategory::from_code(code).map(|category| BucketCount {
                    bucket_start,
                    category,
                    count,
                })
            })
            .collect())
    }

    async fn count_by_category(
        &self,
        range: &TimeRange,
        filter: &ReportFilter,
        _cancel: &CancellationToken,
    ) -> Result<CategoryCounts, DomainError> {
        self.pause().await;
        self.check_failure()?;
        Ok(self
            .matching(range, filter)
            .iter()
            .map(|r| (r.category(), 1))
            .collect())
    }

    async fn latency_by_bucket(
        &self,
        range: &TimeRange,
        granularity: Granularity,
        _cancel: &CancellationToken,
    ) -> Result<Vec<LatencyBucket>, DomainError> {
        self.check_failure()?;
        let mut per_bucket: BTreeMap<DateTime<Utc>, Vec<u64>> = BTreeMap::new();
        for r in self.matching(range, &ReportFilter::empty()) {
            if let Some(latency) = r.latency_ms {
                per_bucket
                    .entry(granularity.bucket_start(r.timestamp))
                    .or_default()
                    .push(latency);
            }
        }
        Ok(per_bucket
            .into_iter()
            .map(|(bucket_start, samples)| LatencyBucket {
                bucket_start,
                avg_ms: samples.iter().sum::<u64>() as f64 / samples.len() as f64,
                max_ms: samples.iter().copied().max().unwrap_or(0),
                samples: samples.len() as u64,
            })
            .collect())
    }

    async fn status_distribution(
        &self,
        range: &TimeRange,
        _cancel: &CancellationToken,
    ) -> Result<Vec<StatusCount>, DomainError> {
        self.check_failure()?;
        let mut per_status: BTreeMap<Option<u16>, u64> = BTreeMap::new();
        for r in self.matching(range, &ReportFilter::empty()) {
            *per_status.entry(r.status_code).or_default() += 1;
        }
        Ok(per_status
            .into_iter()
            .map(|(status_code, count)| StatusCount { status_code, count })
            .collect())
    }
}

// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MockAggregateRepository {
    rows: Arc<RwLock<HashMap<(DateTime<Utc>, Granularity, OutcomeCategory), AggregateRow>>>,
    upserts: Arc<AtomicUsize>,
}

impl MockAggregateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(
        &self,
        bucket_start: DateTime<Utc>,
        granularity: Granularity,
        category: OutcomeCategory,
    ) -> Option<AggregateRow> {
        self.rows
            .read()
            .unwrap()
            .get(&(bucket_start, granularity, category))
            .cloned()
    }

    pub fn all_rows(&self) -> Vec<AggregateRow> {
        let mut rows: Vec<AggregateRow> = self.rows.read().unwrap().values().cloned().collect();
        rows.sort_by_key(|r| (r.granularity, r.bucket_start, r.category.code()));
        rows
    }

    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AggregateRepository for MockAggregateRepository {
    async fn upsert(
        &self,
        bucket_start: DateTime<Utc>,
        granularity: Granularity,
        counts: &CategoryCounts,
    ) -> Result<u64, DomainError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let mut rows = self.rows.write().unwrap();
        let mut changed = 0;
        for (category, count) in counts.iter() {
            let key = (bucket_start, granularity, category);
            match rows.get_mut(&key) {
                Some(row) if row.count == count => {}
                Some(row) => {
                    row.count = count;
                    row.last_updated = now;
                    changed += 1;
                }
                None => {
                    rows.insert(
                        key,
                        AggregateRow {
                            bucket_start,
                            granularity,
                            category,
                            count,
                            last_updated: now,
                        },
                    );
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    async fn rows_in_range(
        &self,
        range: &TimeRange,
        granularity: Granularity,
        _cancel: &CancellationToken,
    ) -> Result<Vec<AggregateRow>, DomainError> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .filter(|r| r.granularity == granularity && range.contains(r.bucket_start))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------

/// Report repository returning `per_bucket` successes in every bucket.
#[derive(Clone)]
pub struct MockReportRepository {
    per_bucket: u64,
    raw_calls: Arc<AtomicUsize>,
    aggregated_calls: Arc<AtomicUsize>,
    fail_next: Arc<AtomicUsize>,
    delay: Arc<RwLock<Option<Duration>>>,
    sources: Arc<Mutex<Vec<ReportSource>>>,
}

impl MockReportRepository {
    pub fn new(per_bucket: u64) -> Self {
        Self {
            per_bucket,
            raw_calls: Arc::new(AtomicUsize::new(0)),
            aggregated_calls: Arc::new(AtomicUsize::new(0)),
            fail_next: Arc::new(AtomicUsize::new(0)),
            delay: Arc::new(RwLock::new(None)),
            sources: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.write().unwrap() = Some(delay);
    }

    /// The next `n` calls fail with a database error.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn raw_calls(&self) -> usize {
        self.raw_calls.load(Ordering::SeqCst)
    }

    pub fn aggregated_calls(&self) -> usize {
        self.aggregated_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.raw_calls() + self.aggregated_calls()
    }

    pub fn sources(&self) -> Vec<ReportSource> {
        self.sources.lock().unwrap().clone()
    }

    async fn answer(
        &self,
        range: &TimeRange,
        granularity: Granularity,
        source: ReportSource,
    ) -> Result<ReportResult, DomainError> {
        self.sources.lock().unwrap().push(source);
        let delay = *self.delay.read().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let should_fail = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(DomainError::DatabaseError("mock report failure".into()));
        }

        let per_bucket = self.per_bucket;
        Ok(ReportResult::from_bucket_counts(
            range,
            granularity,
            granularity
                .bucket_starts(range)
                .into_iter()
                .map(move |start| (start, OutcomeCategory::Success, per_bucket)),
            source,
        ))
    }
}

#[async_trait]
impl ReportRepository for MockReportRepository {
    async fn raw_counts(
        &self,
        range: &TimeRange,
        granularity: Granularity,
        _filter: &ReportFilter,
        _cancel: &CancellationToken,
    ) -> Result<ReportResult, DomainError> {
        self.raw_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(range, granularity, ReportSource::Raw).await
    }

    async fn aggregated_counts(
        &self,
        range: &TimeRange,
        granularity: Granularity,
        filter: &ReportFilter,
        _cancel: &CancellationToken,
    ) -> Result<ReportResult, DomainError> {
        self.aggregated_calls.fetch_add(1, Ordering::SeqCst);
        if !filter.is_empty() {
            return Err(DomainError::AggregatesUnavailable(filter.to_string()));
        }
        self.answer(range, granularity, ReportSource::Aggregated)
            .await
    }
}

// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MockNodeHealthRepository {
    counts: Arc<RwLock<NodeHealthCounts>>,
    should_fail: Arc<AtomicBool>,
}

impl MockNodeHealthRepository {
    pub fn new(healthy: u64, unhealthy: u64) -> Self {
        let repo = Self::default();
        *repo.counts.write().unwrap() = NodeHealthCounts { healthy, unhealthy };
        repo
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl NodeHealthRepository for MockNodeHealthRepository {
    async fn count_health(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<NodeHealthCounts, DomainError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("nodes table unavailable".into()));
        }
        Ok(*self.counts.read().unwrap())
    }
}

// ---------------------------------------------------------------------------

/// Records every range it is asked to invalidate.
#[derive(Clone, Default)]
pub struct RecordingInvalidator {
    ranges: Arc<Mutex<Vec<TimeRange>>>,
}

impl RecordingInvalidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ranges(&self) -> Vec<TimeRange> {
        self.ranges.lock().unwrap().clone()
    }
}

impl CacheInvalidator for RecordingInvalidator {
    fn invalidate(&self, range: &TimeRange) -> usize {
        self.ranges.lock().unwrap().push(*range);
        0
    }
}
