use chrono::{DateTime, NaiveDateTime, Utc};
use ferrous_analytics_domain::{FilterField, Granularity, OutcomeRecord, ReportFilter, TimeRange};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::sync::Arc;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome category code (2/4/5/0) derived from `status_code` in SQL.
pub const CATEGORY_SQL: &str = "CASE status_code / 100 \
     WHEN 2 THEN 2 WHEN 4 THEN 4 WHEN 5 THEN 5 ELSE 0 END";

pub fn granularity_to_sql(g: Granularity) -> &'static str {
    match g {
        Granularity::Hour => "strftime('%Y-%m-%d %H:00:00', created_at)",
        Granularity::Day => "strftime('%Y-%m-%d 00:00:00', created_at)",
        Granularity::Month => "strftime('%Y-%m-01 00:00:00', created_at)",
    }
}

pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// `(from, to)` bind values for a half-open `created_at` scan.
pub fn range_bounds(range: &TimeRange) -> (String, String) {
    (format_ts(range.from), format_ts(range.to))
}

fn filter_column(field: FilterField) -> &'static str {
    match field {
        FilterField::Client => "client",
        FilterField::Node => "node",
        FilterField::Path => "path",
    }
}

/// `AND column = ?` clauses for `filter`, with their bind values in order.
pub fn filter_clause(filter: &ReportFilter) -> (String, Vec<String>) {
    let mut sql = String::new();
    let mut binds = Vec::new();
    for (field, value) in filter.iter() {
        sql.push_str(" AND ");
        sql.push_str(filter_column(field));
        sql.push_str(" = ?");
        binds.push(value.to_string());
    }
    (sql, binds)
}

pub fn row_to_outcome(row: SqliteRow) -> Option<OutcomeRecord> {
    let created_at: String = row.get("created_at");
    let path: String = row.get("path");
    let client: String = row.get("client");

    Some(OutcomeRecord {
        id: Some(row.get("id")),
        timestamp: parse_ts(&created_at)?,
        path: Arc::from(path.as_str()),
        client: Arc::from(client.as_str()),
        node: row
            .get::<Option<String>, _>("node")
            .map(|s| Arc::from(s.as_str())),
        status_code: row
            .get::<Option<i64>, _>("status_code")
            .and_then(|c| u16::try_from(c).ok()),
        latency_ms: row
            .get::<Option<i64>, _>("latency_ms")
            .and_then(|l| u64::try_from(l).ok()),
        is_error: row.get::<i64, _>("is_error") != 0,
        error_message: row
            .get::<Option<String>, _>("error_message")
            .map(|s| Arc::from(s.as_str())),
    })
}
