use ferrous_analytics_domain::{CategoryCounts, OutcomeCategory};

mod helpers;
use helpers::OutcomeRecordBuilder;

#[test]
fn test_category_from_status_classes() {
    assert_eq!(OutcomeCategory::from_status(Some(200)), OutcomeCategory::Success);
    assert_eq!(OutcomeCategory::from_status(Some(204)), OutcomeCategory::Success);
    assert_eq!(OutcomeCategory::from_status(Some(404)), OutcomeCategory::ClientError);
    assert_eq!(OutcomeCategory::from_status(Some(429)), OutcomeCategory::ClientError);
    assert_eq!(OutcomeCategory::from_status(Some(502)), OutcomeCategory::ServerError);
}

#[test]
fn test_redirects_count_as_other() {
    assert_eq!(OutcomeCategory::from_status(Some(301)), OutcomeCategory::Other);
    assert_eq!(OutcomeCategory::from_status(Some(304)), OutcomeCategory::Other);
}

#[test]
fn test_unparseable_and_out_of_range_codes_are_other() {
    assert_eq!(OutcomeCategory::from_status(None), OutcomeCategory::Other);
    assert_eq!(OutcomeCategory::from_status(Some(0)), OutcomeCategory::Other);
    assert_eq!(OutcomeCategory::from_status(Some(101)), OutcomeCategory::Other);
    assert_eq!(OutcomeCategory::from_status(Some(999)), OutcomeCategory::Other);
}

#[test]
fn test_category_code_roundtrip_for_stored_codes() {
    for category in OutcomeCategory::ALL {
        assert_eq!(OutcomeCategory::from_code(category.code()), Some(category));
    }
    assert_eq!(OutcomeCategory::from_code(3), None);
}

#[test]
fn test_every_record_maps_to_exactly_one_category() {
    for code in [None, Some(100), Some(200), Some(302), Some(418), Some(503), Some(700)] {
        let record = OutcomeRecordBuilder::new().status(code).build();
        let matching = OutcomeCategory::ALL
            .iter()
            .filter(|c| **c == record.category())
            .count();
        assert_eq!(matching, 1, "status {:?}", code);
    }
}

#[test]
fn test_category_counts_total_is_sum_of_subtotals() {
    let mut counts = CategoryCounts::default();
    counts.add(OutcomeCategory::Success, 10);
    counts.add(OutcomeCategory::ClientError, 3);
    counts.add(OutcomeCategory::ServerError, 2);
    counts.add(OutcomeCategory::Other, 1);

    assert_eq!(counts.total(), 16);
    assert_eq!(counts.iter().map(|(_, n)| n).sum::<u64>(), counts.total());
}

#[test]
fn test_category_counts_set_replaces() {
    let mut counts = CategoryCounts::default();
    counts.add(OutcomeCategory::Success, 10);
    counts.set(OutcomeCategory::Success, 0);
    assert!(counts.is_zero());
}

#[test]
fn test_category_counts_iter_includes_zeros() {
    let counts = CategoryCounts::default();
    assert_eq!(counts.iter().count(), 4);
}
