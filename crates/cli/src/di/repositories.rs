use ferrous_analytics_application::services::StoreReportRepository;
use ferrous_analytics_domain::config::DatabaseConfig;
use ferrous_analytics_infrastructure::repositories::{
    SqliteAggregateRepository, SqliteNodeHealthRepository, SqliteOutcomeRepository,
};
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct Repositories {
    pub outcomes: Arc<SqliteOutcomeRepository>,
    pub aggregates: Arc<SqliteAggregateRepository>,
    pub nodes: Arc<SqliteNodeHealthRepository>,
    pub reports: Arc<StoreReportRepository>,
}

impl Repositories {
    pub fn new(write_pool: SqlitePool, read_pool: SqlitePool, cfg: &DatabaseConfig) -> Self {
        let outcomes = Arc::new(SqliteOutcomeRepository::new(
            write_pool.clone(),
            read_pool.clone(),
            cfg,
        ));
        let aggregates = Arc::new(SqliteAggregateRepository::new(write_pool));
        let reports = Arc::new(StoreReportRepository::new(
            outcomes.clone(),
            aggregates.clone(),
        ));

        Self {
            outcomes,
            aggregates,
            nodes: Arc::new(SqliteNodeHealthRepository::new(read_pool)),
            reports,
        }
    }
}
