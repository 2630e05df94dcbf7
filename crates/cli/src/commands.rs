use crate::di::{Repositories, UseCases};
use chrono::{DateTime, Utc};
use ferrous_analytics_domain::{Config, Granularity, OutcomeRecord, ReportFilter};
use ferrous_analytics_jobs::{AggregationJob, CacheMaintenanceJob, JobRunner};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn serve(config: &Config, use_cases: &UseCases) -> anyhow::Result<()> {
    let jobs = JobRunner::new()
        .with_aggregation(
            AggregationJob::new(use_cases.aggregate.clone())
                .with_interval(config.analytics.aggregation_interval_secs),
        )
        .with_cache_maintenance(
            CacheMaintenanceJob::new(use_cases.maintenance.clone())
                .with_interval(config.analytics.cache_maintenance_interval_secs),
        )
        .start()
        .await;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    jobs.shutdown().await;

    let stats = use_cases.report_cache.stats();
    info!(
        hits = stats.hits,
        misses = stats.misses,
        coalesced = stats.coalesced,
        "Report cache statistics"
    );
    Ok(())
}

pub async fn aggregate(use_cases: &UseCases) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let outcome = use_cases.aggregate.execute(&cancel).await?;
    println!(
        "buckets={} failed={} rows_changed={} cancelled={}",
        outcome.buckets_processed, outcome.buckets_failed, outcome.rows_changed, outcome.cancelled
    );
    Ok(())
}

pub async fn report(
    use_cases: &UseCases,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    granularity: Granularity,
    filter: &ReportFilter,
) -> anyhow::Result<()> {
    let report = use_cases
        .report_cache
        .get(from, to, granularity, filter, &CancellationToken::new())
        .await?;
    print_json(report.as_ref())
}

pub async fn overview(
    use_cases: &UseCases,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> anyhow::Result<()> {
    let overview = use_cases
        .overview_cache
        .get(from, to, &CancellationToken::new())
        .await?;
    print_json(overview.as_ref())
}

pub async fn records(
    use_cases: &UseCases,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    filter: &ReportFilter,
    limit: u32,
    cursor: Option<i64>,
) -> anyhow::Result<()> {
    let page = use_cases
        .get_outcome_page
        .execute(from, to, filter, limit, cursor)
        .await?;
    print_json(&page)
}

pub async fn record(
    repos: &Repositories,
    use_cases: &UseCases,
    record: OutcomeRecord,
) -> anyhow::Result<()> {
    use_cases.record_outcome.execute(&record).await?;
    repos.outcomes.flush().await?;
    info!(
        path = %record.path,
        client = %record.client,
        category = record.category().as_str(),
        "Outcome recorded"
    );
    Ok(())
}
