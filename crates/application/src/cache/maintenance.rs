use super::{OverviewCache, ReportCache};
use crate::ports::{CacheCompactionOutcome, CacheMaintenancePort};
use async_trait::async_trait;
use ferrous_analytics_domain::DomainError;
use std::sync::Arc;
use tracing::debug;

/// Implements `CacheMaintenancePort` over the report and overview caches.
pub struct AnalyticsCacheMaintenance {
    reports: Arc<ReportCache>,
    overviews: Arc<OverviewCache>,
}

impl AnalyticsCacheMaintenance {
    pub fn new(reports: Arc<ReportCache>, overviews: Arc<OverviewCache>) -> Self {
        Self { reports, overviews }
    }
}

#[async_trait]
impl CacheMaintenancePort for AnalyticsCacheMaintenance {
    async fn run_compaction_cycle(&self) -> Result<CacheCompactionOutcome, DomainError> {
        let reports_removed = self.reports.purge_expired();
        let overviews_removed = self.overviews.purge_expired();

        debug!(
            reports_removed,
            overviews_removed,
            "Analytics cache compaction pass finished"
        );

        Ok(CacheCompactionOutcome {
            entries_removed: reports_removed + overviews_removed,
            cache_size: self.reports.slot_count() + self.overviews.slot_count(),
        })
    }
}
