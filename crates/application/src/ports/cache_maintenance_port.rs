use async_trait::async_trait;
use ferrous_analytics_domain::DomainError;

/// Outcome of a cache compaction cycle.
#[derive(Debug, Default, Clone)]
pub struct CacheCompactionOutcome {
    pub entries_removed: usize,
    pub cache_size: usize,
}

/// Port for periodic report cache upkeep.
#[async_trait]
pub trait CacheMaintenancePort: Send + Sync {
    /// Drop expired entries and idle per-key locks left behind by failed computations.
    async fn run_compaction_cycle(&self) -> Result<CacheCompactionOutcome, DomainError>;
}
