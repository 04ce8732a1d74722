//! Tests for valuation results.

use shapley_oracle::{
    exact_shapley, FnUtility, NoProgress, SortOrder, Subset, ValuationResult, ValuationStatus,
};

fn weighted_game() -> FnUtility<impl Fn(&Subset) -> f64 + Send + Sync> {
    let weights = [3.0, -1.0, 2.0, 0.0];
    FnUtility::new(4, move |s: &Subset| s.iter().map(|i| weights[i]).sum())
        .with_names(vec!["w".into(), "x".into(), "y".into(), "z".into()])
}

#[test]
fn names_come_from_the_utility() {
    let r = exact_shapley(&weighted_game(), &NoProgress).unwrap();
    assert_eq!(r.names(), &["w", "x", "y", "z"]);
    assert!((r.value_of("y").unwrap() - 2.0).abs() < 1e-12);
    assert_eq!(r.position_of("x"), Some(1));
}

#[test]
fn descending_sort_visits_best_first() {
    let r = exact_shapley(&weighted_game(), &NoProgress)
        .unwrap()
        .sorted(SortOrder::Descending);
    let names: Vec<String> = r.iter().map(|item| item.name).collect();
    assert_eq!(names, vec!["w", "y", "z", "x"]);
    // Per-index arrays are unchanged
    assert!((r.values()[0] - 3.0).abs() < 1e-12);
}

#[test]
fn sorting_twice_is_stable() {
    let r = exact_shapley(&weighted_game(), &NoProgress).unwrap();
    let once = r.clone().sorted(SortOrder::Ascending);
    let twice = once.clone().sorted(SortOrder::Ascending);
    assert_eq!(once.indices(), twice.indices());
}

#[test]
fn total_is_the_grand_coalition() {
    let r = exact_shapley(&weighted_game(), &NoProgress).unwrap();
    assert!((r.total() - 4.0).abs() < 1e-12);
}

#[test]
fn serializes_to_json() {
    let r = ValuationResult::new(
        "manual",
        ValuationStatus::MaxIterations,
        vec![1.0, 2.0],
        vec![0.1, 0.2],
        vec![3, 3],
        vec!["a".into(), "b".into()],
    )
    .unwrap();
    let json = serde_json::to_value(&r).unwrap();
    assert_eq!(json["algorithm"], "manual");
    assert_eq!(json["status"], "MaxIterations");
    assert_eq!(json["values"][1], 2.0);

    let item = serde_json::to_value(r.get(0).unwrap()).unwrap();
    assert_eq!(item["name"], "a");
}

#[test]
fn out_of_range_position_is_none() {
    let r = exact_shapley(&weighted_game(), &NoProgress).unwrap();
    assert!(r.get(4).is_none());
    assert_eq!(r.len(), 4);
}
