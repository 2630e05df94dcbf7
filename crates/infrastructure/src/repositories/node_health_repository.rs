use super::outcome_repository::format_ts;
use async_trait::async_trait;
use chrono::Utc;
use ferrous_analytics_application::cancellation::run_cancellable;
use ferrous_analytics_application::ports::NodeHealthRepository;
use ferrous_analytics_domain::{DomainError, NodeHealthCounts};
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, instrument};

/// Reads the `nodes` table maintained by the health poller.
pub struct SqliteNodeHealthRepository {
    pool: SqlitePool,
}

impl SqliteNodeHealthRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Records the latest probe result for `name`.
    #[instrument(skip(self))]
    pub async fn set_health(&self, name: &str, healthy: bool) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO nodes (name, healthy, last_checked) VALUES (?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET
                 healthy = excluded.healthy,
                 last_checked = excluded.last_checked",
        )
        .bind(name)
        .bind(healthy as i64)
        .bind(format_ts(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to record node health");
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }
}

#[async_trait]
impl NodeHealthRepository for SqliteNodeHealthRepository {
    #[instrument(skip(self, cancel))]
    async fn count_health(
        &self,
        cancel: &CancellationToken,
    ) -> Result<NodeHealthCounts, DomainError> {
        let (healthy, unhealthy) = run_cancellable(cancel, async {
            sqlx::query_as::<_, (i64, i64)>(
                "SELECT
                     COALESCE(SUM(CASE WHEN healthy = 1 THEN 1 ELSE 0 END), 0),
                     COALESCE(SUM(CASE WHEN healthy = 1 THEN 0 ELSE 1 END), 0)
                 FROM nodes",
            )
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to count node health");
                DomainError::DatabaseError(e.to_string())
            })
        })
        .await?;

        Ok(NodeHealthCounts {
            healthy: healthy as u64,
            unhealthy: unhealthy as u64,
        })
    }
}
