use super::outcome_repository::{format_ts, parse_ts};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ferrous_analytics_application::cancellation::run_cancellable;
use ferrous_analytics_application::ports::AggregateRepository;
use ferrous_analytics_domain::{
    AggregateRow, CategoryCounts, DomainError, Granularity, OutcomeCategory, TimeRange,
};
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument};

type AggregateSqlRow = (String, String, i64, i64, String);

pub struct SqliteAggregateRepository {
    pool: SqlitePool,
}

impl SqliteAggregateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_aggregate(row: AggregateSqlRow) -> Option<AggregateRow> {
        let (bucket_start, granularity, category, count, last_updated) = row;

        Some(AggregateRow {
            bucket_start: parse_ts(&bucket_start)?,
            granularity: granularity.parse().ok()?,
            category: OutcomeCategory::from_code(category)?,
            count: u64::try_from(count).ok()?,
            last_updated: parse_ts(&last_updated)?,
        })
    }
}

#[async_trait]
impl AggregateRepository for SqliteAggregateRepository {
    #[instrument(skip(self, counts), fields(bucket = %bucket_start, granularity = %granularity))]
    async fn upsert(
        &self,
        bucket_start: DateTime<Utc>,
        granularity: Granularity,
        counts: &CategoryCounts,
    ) -> Result<u64, DomainError> {
        let bucket = format_ts(bucket_start);
        let now = format_ts(Utc::now());

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!(error = %e, "Failed to begin aggregate transaction");
            DomainError::DatabaseError(e.to_string())
        })?;

        let mut changed = 0u64;
        for category in OutcomeCategory::ALL {
            let result = sqlx::query(
                "INSERT INTO outcome_aggregates (bucket_start, granularity, category, count, last_updated)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(bucket_start, granularity, category) DO UPDATE SET
                     count = excluded.count,
                     last_updated = excluded.last_updated
                 WHERE outcome_aggregates.count != excluded.count",
            )
            .bind(&bucket)
            .bind(granularity.as_str())
            .bind(category.code())
            .bind(counts.get(category) as i64)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!(error = %e, category = %category, "Failed to upsert aggregate");
                DomainError::DatabaseError(e.to_string())
            })?;
            changed += result.rows_affected();
        }

        tx.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit aggregate transaction");
            DomainError::DatabaseError(e.to_string())
        })?;

        debug!(changed, "Aggregate bucket written");
        Ok(changed)
    }

    #[instrument(skip(self, cancel), fields(range = %range, granularity = %granularity))]
    async fn rows_in_range(
        &self,
        range: &TimeRange,
        granularity: Granularity,
        cancel: &CancellationToken,
    ) -> Result<Vec<AggregateRow>, DomainError> {
        let from = format_ts(range.from);
        let to = format_ts(range.to);

        let rows = run_cancellable(cancel, async {
            sqlx::query_as::<_, AggregateSqlRow>(
                "SELECT bucket_start, granularity, category, count, last_updated
                 FROM outcome_aggregates
                 WHERE granularity = ? AND bucket_start >= ? AND bucket_start < ?
                 ORDER BY bucket_start, category",
            )
            .bind(granularity.as_str())
            .bind(&from)
            .bind(&to)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to read aggregates");
                DomainError::DatabaseError(e.to_string())
            })
        })
        .await?;

        let total = rows.len();
        let parsed: Vec<AggregateRow> = rows.into_iter().filter_map(Self::row_to_aggregate).collect();
        if parsed.len() != total {
            error!(skipped = total - parsed.len(), "Skipped malformed aggregate rows");
        }
        Ok(parsed)
    }
}
