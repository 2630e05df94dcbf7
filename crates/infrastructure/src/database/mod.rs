use ferrous_analytics_domain::config::DatabaseConfig;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

fn connect_options(cfg: &DatabaseConfig) -> Result<SqliteConnectOptions, sqlx::Error> {
    let url = if cfg.path.starts_with("sqlite:") {
        cfg.path.clone()
    } else {
        format!("sqlite:{}", cfg.path)
    };

    Ok(SqliteConnectOptions::from_str(&url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(cfg.write_busy_timeout_secs)))
}

/// Pool used by the outcome writer and the aggregation job. Runs migrations.
pub async fn create_write_pool(cfg: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.write_pool_max_connections)
        .connect_with(connect_options(cfg)?.journal_mode(SqliteJournalMode::Wal))
        .await?;

    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(&pool).await?;

    info!(
        path = %cfg.path,
        max_connections = cfg.write_pool_max_connections,
        "Write pool ready"
    );
    Ok(pool)
}

pub async fn create_read_pool(cfg: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.read_pool_max_connections)
        .connect_with(connect_options(cfg)?.read_only(true))
        .await?;

    info!(
        max_connections = cfg.read_pool_max_connections,
        "Read pool ready"
    );
    Ok(pool)
}
