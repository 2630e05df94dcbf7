#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

pub fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

pub async fn create_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::query(
        r#"
        CREATE TABLE outcome_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at TEXT NOT NULL,
            path TEXT NOT NULL,
            client TEXT NOT NULL,
            node TEXT,
            status_code INTEGER,
            latency_ms INTEGER,
            is_error INTEGER NOT NULL DEFAULT 0,
            error_message TEXT
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query(
        r#"
        CREATE TABLE outcome_aggregates (
            bucket_start TEXT NOT NULL,
            granularity TEXT NOT NULL,
            category INTEGER NOT NULL,
            count INTEGER NOT NULL DEFAULT 0,
            last_updated TEXT NOT NULL,
            PRIMARY KEY (bucket_start, granularity, category)
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query(
        r#"
        CREATE TABLE nodes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            healthy INTEGER NOT NULL DEFAULT 0,
            last_checked TEXT
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    pool
}

pub async fn insert_outcome(
    pool: &SqlitePool,
    created_at: &str,
    client: &str,
    status_code: Option<i64>,
    latency_ms: Option<i64>,
) {
    sqlx::query(
        "INSERT INTO outcome_log (created_at, path, client, node, status_code, latency_ms, is_error)
         VALUES (?, '/api/items', ?, 'node-a', ?, ?, ?)",
    )
    .bind(created_at)
    .bind(client)
    .bind(status_code)
    .bind(latency_ms)
    .bind(status_code.is_none_or(|c| c >= 500) as i64)
    .execute(pool)
    .await
    .unwrap();
}
