use super::Repositories;
use ferrous_analytics_application::cache::{
    AnalyticsCacheMaintenance, OverviewCache, ReportCache, ReportCachePolicy,
};
use ferrous_analytics_application::use_cases::{
    AggregateOutcomesUseCase, GetOutcomePageUseCase, RecordOutcomeUseCase,
};
use ferrous_analytics_domain::AnalyticsConfig;
use std::sync::Arc;

pub struct UseCases {
    pub report_cache: Arc<ReportCache>,
    pub overview_cache: Arc<OverviewCache>,
    pub maintenance: Arc<AnalyticsCacheMaintenance>,
    pub aggregate: Arc<AggregateOutcomesUseCase>,
    pub record_outcome: Arc<RecordOutcomeUseCase>,
    pub get_outcome_page: Arc<GetOutcomePageUseCase>,
}

impl UseCases {
    pub fn new(repos: &Repositories, config: &AnalyticsConfig) -> Self {
        let report_cache = Arc::new(ReportCache::new(
            repos.reports.clone(),
            ReportCachePolicy::from_config(config),
        ));
        let overview_cache = Arc::new(OverviewCache::new(
            repos.outcomes.clone(),
            repos.nodes.clone(),
        ));

        let aggregate = AggregateOutcomesUseCase::new(
            repos.outcomes.clone(),
            repos.aggregates.clone(),
            config,
        )
        .with_invalidator(report_cache.clone())
        .with_invalidator(overview_cache.clone());

        let record_outcome = RecordOutcomeUseCase::new(repos.outcomes.clone(), config)
            .with_invalidator(report_cache.clone())
            .with_invalidator(overview_cache.clone());

        Self {
            maintenance: Arc::new(AnalyticsCacheMaintenance::new(
                report_cache.clone(),
                overview_cache.clone(),
            )),
            report_cache,
            overview_cache,
            aggregate: Arc::new(aggregate),
            record_outcome: Arc::new(record_outcome),
            get_outcome_page: Arc::new(GetOutcomePageUseCase::new(repos.outcomes.clone())),
        }
    }
}
