use super::helpers::{
    filter_clause, granularity_to_sql, parse_ts, range_bounds, row_to_outcome, CATEGORY_SQL,
};
use ferrous_analytics_application::cancellation::run_cancellable;
use ferrous_analytics_application::ports::{BucketCount, LatencyBucket};
use ferrous_analytics_domain::{
    CategoryCounts, DomainError, Granularity, OutcomeCategory, OutcomePage, OutcomeRecord,
    ReportFilter, StatusCount, TimeRange,
};
use sqlx::{Row, SqlitePool};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| {
        error!(error = %e, "{}", context);
        DomainError::DatabaseError(e.to_string())
    }
}

#[instrument(skip(pool, filter), fields(range = %range, filter = %filter))]
pub(super) async fn get_page(
    pool: &SqlitePool,
    range: &TimeRange,
    filter: &ReportFilter,
    limit: u32,
    cursor: Option<i64>,
) -> Result<OutcomePage, DomainError> {
    let (from, to) = range_bounds(range);
    let (filter_sql, filter_binds) = filter_clause(filter);
    let cursor_sql = if cursor.is_some() { " AND id < ?" } else { "" };
    let sql = format!(
        "SELECT id, created_at, path, client, node, status_code, latency_ms, is_error, error_message
         FROM outcome_log
         WHERE created_at >= ? AND created_at < ?{filter_sql}{cursor_sql}
         ORDER BY id DESC
         LIMIT ?"
    );

    let mut query = sqlx::query(&sql).bind(from).bind(to);
    for value in &filter_binds {
        query = query.bind(value.as_str());
    }
    if let Some(cursor_id) = cursor {
        query = query.bind(cursor_id);
    }
    let mut rows = query
        .bind(limit as i64 + 1)
        .fetch_all(pool)
        .await
        .map_err(db_error("Failed to fetch outcome page"))?;

    let has_more = rows.len() as u32 > limit;
    if has_more {
        rows.truncate(limit as usize);
    }
    let next_cursor = if has_more {
        rows.last().map(|r| r.get::<i64, _>("id"))
    } else {
        None
    };

    let records: Vec<OutcomeRecord> = rows.into_iter().filter_map(row_to_outcome).collect();
    debug!(count = records.len(), next_cursor, "Outcome page fetched");
    Ok(OutcomePage {
        records,
        next_cursor,
    })
}

#[instrument(skip(pool, filter, cancel), fields(range = %range, filter = %filter))]
pub(super) async fn count_by_bucket(
    pool: &SqlitePool,
    range: &TimeRange,
    granularity: Granularity,
    filter: &ReportFilter,
    cancel: &CancellationToken,
) -> Result<Vec<BucketCount>, DomainError> {
    let (from, to) = range_bounds(range);
    let (filter_sql, filter_binds) = filter_clause(filter);
    let sql = format!(
        "SELECT {bucket} AS bucket, {CATEGORY_SQL} AS category, COUNT(*) AS count
         FROM outcome_log
         WHERE created_at >= ? AND created_at < ?{filter_sql}
         GROUP BY bucket, category
         ORDER BY bucket, category",
        bucket = granularity_to_sql(granularity),
    );

    let rows = run_cancellable(cancel, async {
        let mut query = sqlx::query(&sql).bind(&from).bind(&to);
        for value in &filter_binds {
            query = query.bind(value.as_str());
        }
        query
            .fetch_all(pool)
            .await
            .map_err(db_error("Failed to count outcomes by bucket"))
    })
    .await?;

    let mut cells = Vec::with_capacity(rows.len());
    for row in rows {
        let bucket: String = row.get("bucket");
        let code: i64 = row.get("category");
        match (parse_ts(&bucket), OutcomeCategory::from_code(code)) {
            (Some(bucket_start), Some(category)) => cells.push(BucketCount {
                bucket_start,
                category,
                count: row.get::<i64, _>("count") as u64,
            }),
            _ => warn!(bucket = %bucket, code, "Skipping unparseable bucket row"),
        }
    }

    debug!(cells = cells.len(), "Outcome buckets counted");
    Ok(cells)
}

#[instrument(skip(pool, filter, cancel), fields(range = %range, filter = %filter))]
pub(super) async fn count_by_category(
    pool: &SqlitePool,
    range: &TimeRange,
    filter: &ReportFilter,
    cancel: &CancellationToken,
) -> Result<CategoryCounts, DomainError> {
    let (from, to) = range_bounds(range);
    let (filter_sql, filter_binds) = filter_clause(filter);
    let sql = format!(
        "SELECT {CATEGORY_SQL} AS category, COUNT(*) AS count
         FROM outcome_log
         WHERE created_at >= ? AND created_at < ?{filter_sql}
         GROUP BY category"
    );

    let rows = run_cancellable(cancel, async {
        let mut query = sqlx::query(&sql).bind(&from).bind(&to);
        for value in &filter_binds {
            query = query.bind(value.as_str());
        }
        query
            .fetch_all(pool)
            .await
            .map_err(db_error("Failed to count outcomes by category"))
    })
    .await?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            OutcomeCategory::from_code(row.get("category"))
                .map(|category| (category, row.get::<i64, _>("count") as u64))
        })
        .collect())
}

#[instrument(skip(pool, cancel), fields(range = %range))]
pub(super) async fn latency_by_bucket(
    pool: &SqlitePool,
    range: &TimeRange,
    granularity: Granularity,
    cancel: &CancellationToken,
) -> Result<Vec<LatencyBucket>, DomainError> {
    let (from, to) = range_bounds(range);
    let sql = format!(
        "SELECT {bucket} AS bucket,
                AVG(latency_ms) AS avg_ms,
                MAX(latency_ms) AS max_ms,
                COUNT(latency_ms) AS samples
         FROM outcome_log
         WHERE created_at >= ? AND created_at < ? AND latency_ms IS NOT NULL
         GROUP BY bucket
         ORDER BY bucket",
        bucket = granularity_to_sql(granularity),
    );

    let rows = run_cancellable(cancel, async {
        sqlx::query(&sql)
            .bind(&from)
            .bind(&to)
            .fetch_all(pool)
            .await
            .map_err(db_error("Failed to compute latency timeline"))
    })
    .await?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let bucket: String = row.get("bucket");
            Some(LatencyBucket {
                bucket_start: parse_ts(&bucket)?,
                avg_ms: row.get::<Option<f64>, _>("avg_ms").unwrap_or(0.0),
                max_ms: row.get::<Option<i64>, _>("max_ms").unwrap_or(0) as u64,
                samples: row.get::<i64, _>("samples") as u64,
            })
        })
        .collect())
}

#[instrument(skip(pool, cancel), fields(range = %range))]
pub(super) async fn status_distribution(
    pool: &SqlitePool,
    range: &TimeRange,
    cancel: &CancellationToken,
) -> Result<Vec<StatusCount>, DomainError> {
    let (from, to) = range_bounds(range);

    let rows = run_cancellable(cancel, async {
        sqlx::query(
            "SELECT status_code, COUNT(*) AS count
             FROM outcome_log
             WHERE created_at >= ? AND created_at < ?
             GROUP BY status_code
             ORDER BY status_code",
        )
        .bind(&from)
        .bind(&to)
        .fetch_all(pool)
        .await
        .map_err(db_error("Failed to compute status distribution"))
    })
    .await?;

    Ok(rows
        .iter()
        .map(|row| StatusCount {
            status_code: row
                .get::<Option<i64>, _>("status_code")
                .and_then(|c| u16::try_from(c).ok()),
            count: row.get::<i64, _>("count") as u64,
        })
        .collect())
}
