mod helpers;
mod reader;
mod writer;

pub use helpers::{format_ts, parse_ts, TIMESTAMP_FORMAT};

use async_trait::async_trait;
use ferrous_analytics_application::ports::{BucketCount, LatencyBucket, OutcomeRepository};
use ferrous_analytics_domain::{
    config::DatabaseConfig, CategoryCounts, DomainError, Granularity, OutcomePage, OutcomeRecord,
    ReportFilter, StatusCount, TimeRange,
};
use sqlx::SqlitePool;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use writer::{OutcomeEntry, WriterMessage};

/// Raw outcome store over SQLite.
///
/// Writes go through a bounded channel to a background task that inserts
/// them in batches; reads hit the read pool directly.
pub struct SqliteOutcomeRepository {
    read_pool: SqlitePool,
    sender: mpsc::Sender<WriterMessage>,
}

impl SqliteOutcomeRepository {
    pub fn new(write_pool: SqlitePool, read_pool: SqlitePool, cfg: &DatabaseConfig) -> Self {
        let channel_capacity = cfg.outcome_channel_capacity;
        let max_batch_size = cfg.outcome_max_batch_size;
        let flush_interval_ms = cfg.outcome_flush_interval_ms;

        let (sender, receiver) = mpsc::channel(channel_capacity);

        tokio::spawn(async move {
            writer::flush_loop(write_pool, receiver, max_batch_size, flush_interval_ms).await;
        });

        info!(
            channel_capacity,
            batch_size = max_batch_size,
            flush_interval_ms,
            "Outcome log batching enabled"
        );

        Self { read_pool, sender }
    }

    /// Single pool for both sides with default batching.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self::new(pool.clone(), pool, &DatabaseConfig::default())
    }

    /// Waits until every record logged before this call has been written.
    pub async fn flush(&self) -> Result<(), DomainError> {
        let (ack, done) = oneshot::channel();
        let closed = || DomainError::DatabaseError("outcome writer is not running".to_string());
        self.sender
            .send(WriterMessage::Flush(ack))
            .await
            .map_err(|_| closed())?;
        done.await.map_err(|_| closed())
    }
}

#[async_trait]
impl OutcomeRepository for SqliteOutcomeRepository {
    async fn log_outcome(&self, record: &OutcomeRecord) -> Result<(), DomainError> {
        let entry = OutcomeEntry::from_record(record);
        match self.sender.try_send(WriterMessage::Entry(entry)) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Outcome log channel full, dropping record");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("Outcome log channel closed");
                Err(DomainError::DatabaseError(
                    "outcome writer is not running".to_string(),
                ))
            }
        }
    }

    async fn get_page(
        &self,
        range: &TimeRange,
        filter: &ReportFilter,
        limit: u32,
        cursor: Option<i64>,
    ) -> Result<OutcomePage, DomainError> {
        reader::get_page(&self.read_pool, range, filter, limit, cursor).await
    }

    async fn count_by_bucket(
        &self,
        range: &TimeRange,
        granularity: Granularity,
        filter: &ReportFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<BucketCount>, DomainError> {
        reader::count_by_bucket(&self.read_pool, range, granularity, filter, cancel).await
    }

    async fn count_by_category(
        &self,
        range: &TimeRange,
        filter: &ReportFilter,
        cancel: &CancellationToken,
    ) -> Result<CategoryCounts, DomainError> {
        reader::count_by_category(&self.read_pool, range, filter, cancel).await
    }

    async fn latency_by_bucket(
        &self,
        range: &TimeRange,
        granularity: Granularity,
        cancel: &CancellationToken,
    ) -> Result<Vec<LatencyBucket>, DomainError> {
        reader::latency_by_bucket(&self.read_pool, range, granularity, cancel).await
    }

    async fn status_distribution(
        &self,
        range: &TimeRange,
        cancel: &CancellationToken,
    ) -> Result<Vec<StatusCount>, DomainError> {
        reader::status_distribution(&self.read_pool, range, cancel).await
    }
}
