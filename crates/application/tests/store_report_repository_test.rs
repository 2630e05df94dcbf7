use ferrous_analytics_application::ports::{AggregateRepository, ReportRepository};
use ferrous_analytics_application::services::StoreReportRepository;
use ferrous_analytics_domain::{
    CategoryCounts, DomainError, FilterField, Granularity, OutcomeCategory, ReportFilter,
    ReportSource, TimeRange,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod helpers;
use helpers::{record, ts, MockAggregateRepository, MockOutcomeRepository};

fn engine(
    outcomes: &MockOutcomeRepository,
    aggregates: &MockAggregateRepository,
) -> StoreReportRepository {
    StoreReportRepository::new(Arc::new(outcomes.clone()), Arc::new(aggregates.clone()))
}

#[tokio::test]
async fn test_scenario_b_aggregated_single_day() {
    let aggregates = MockAggregateRepository::new();
    let day = ts(2024, 5, 10, 0, 0);
    let counts: CategoryCounts = [
        (OutcomeCategory::Success, 100),
        (OutcomeCategory::ClientError, 20),
        (OutcomeCategory::ServerError, 5),
        (OutcomeCategory::Other, 1),
    ]
    .into_iter()
    .collect();
    aggregates.upsert(day, Granularity::Day, &counts).await.unwrap();

    let repo = engine(&MockOutcomeRepository::new(), &aggregates);
    let report = repo
        .aggregated_counts(
            &TimeRange::new(day, day).unwrap(),
            Granularity::Day,
            &ReportFilter::empty(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.source(), ReportSource::Aggregated);
    assert_eq!(report.total_requests(), 126);
    assert_eq!(report.count(OutcomeCategory::Success), 100);
    assert_eq!(report.count(OutcomeCategory::ClientError), 20);
    assert_eq!(report.count(OutcomeCategory::ServerError), 5);
    assert_eq!(report.count(OutcomeCategory::Other), 1);
    assert_eq!(report.slots().len(), 1);
    assert_eq!(report.slots()[0].label, "2024-05-10");
}

#[tokio::test]
async fn test_aggregated_rejects_filter() {
    let repo = engine(&MockOutcomeRepository::new(), &MockAggregateRepository::new());
    let result = repo
        .aggregated_counts(
            &TimeRange::new(ts(2024, 5, 1, 0, 0), ts(2024, 5, 3, 0, 0)).unwrap(),
            Granularity::Day,
            &ReportFilter::empty().with(FilterField::Path, "/api"),
            &CancellationToken::new(),
        )
        .await;

    assert!(matches!(result, Err(DomainError::AggregatesUnavailable(_))));
}

#[tokio::test]
async fn test_raw_and_aggregated_produce_same_shape() {
    let outcomes = MockOutcomeRepository::with_records(vec![
        record(ts(2024, 5, 1, 8, 0), Some(200)),
        record(ts(2024, 5, 1, 9, 0), Some(500)),
        record(ts(2024, 5, 3, 10, 0), Some(301)),
        record(ts(2024, 5, 3, 11, 0), None),
    ]);
    let aggregates = MockAggregateRepository::new();
    let cancel = CancellationToken::new();

    for day in [1, 2, 3] {
        let start = ts(2024, 5, day, 0, 0);
        let bucket = TimeRange::new(start, ts(2024, 5, day + 1, 0, 0)).unwrap();
        let cells = outcomes_counts(&outcomes, &bucket, &cancel).await;
        aggregates.upsert(start, Granularity::Day, &cells).await.unwrap();
    }

    let repo = engine(&outcomes, &aggregates);
    let range = TimeRange::new(ts(2024, 5, 1, 0, 0), ts(2024, 5, 4, 0, 0)).unwrap();
    let raw = repo
        .raw_counts(&range, Granularity::Day, &ReportFilter::empty(), &cancel)
        .await
        .unwrap();
    let agg = repo
        .aggregated_counts(&range, Granularity::Day, &ReportFilter::empty(), &cancel)
        .await
        .unwrap();

    assert_eq!(raw.slots(), agg.slots());
    assert_eq!(raw.totals(), agg.totals());
    assert_eq!(raw.total_requests(), 4);
    assert_eq!(raw.count(OutcomeCategory::Other), 2);
    assert_eq!(raw.slots()[1].total(), 0);
}

async fn outcomes_counts(
    outcomes: &MockOutcomeRepository,
    bucket: &TimeRange,
    cancel: &CancellationToken,
) -> CategoryCounts {
    use ferrous_analytics_application::ports::OutcomeRepository;
    outcomes
        .count_by_bucket(bucket, Granularity::Day, &ReportFilter::empty(), cancel)
        .await
        .unwrap()
        .into_iter()
        .map(|c| (c.category, c.count))
        .collect()
}

#[tokio::test]
async fn test_raw_counts_apply_filter() {
    let mut other_client = record(ts(2024, 5, 1, 9, 0), Some(200));
    other_client.client = Arc::from("10.9.9.9");
    let outcomes = MockOutcomeRepository::with_records(vec![
        record(ts(2024, 5, 1, 8, 0), Some(200)),
        other_client,
    ]);

    let repo = engine(&outcomes, &MockAggregateRepository::new());
    let report = repo
        .raw_counts(
            &TimeRange::new(ts(2024, 5, 1, 0, 0), ts(2024, 5, 2, 0, 0)).unwrap(),
            Granularity::Hour,
            &ReportFilter::empty().with(FilterField::Client, "10.9.9.9"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.total_requests(), 1);
    assert_eq!(report.slots().len(), 24);
    assert_eq!(report.slots()[9].total(), 1);
}
