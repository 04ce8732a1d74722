//! Tests for model utilities and their cache.

use nalgebra::{DMatrix, DVector};

use shapley_oracle::{
    exact_shapley, permutation_montecarlo, Dataset, LinearRegression, ModelUtility, NoProgress,
    PermutationConfig, Subset, Utility,
};

/// Training targets on `y = 2x + 1`, except point 3 which is an outlier.
fn dataset() -> Dataset {
    let x_train = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
    let y_train = DVector::from_vec(vec![1.0, 3.0, 5.0, -20.0]);
    let x_test = DMatrix::from_row_slice(4, 1, &[0.5, 1.5, 2.5, 3.5]);
    let y_test = DVector::from_vec(vec![2.0, 4.0, 6.0, 8.0]);
    Dataset::new(x_train, y_train, x_test, y_test)
        .unwrap()
        .with_names(vec!["a".into(), "b".into(), "c".into(), "outlier".into()])
        .unwrap()
}

#[test]
fn clean_pair_fits_perfectly() {
    let u = ModelUtility::new(LinearRegression::new(), dataset());
    let score = u.evaluate(&Subset::new([0, 2])).unwrap();
    assert!((score - 1.0).abs() < 1e-9);
}

#[test]
fn outlier_has_the_lowest_exact_value() {
    let u = ModelUtility::new(LinearRegression::new(), dataset()).catch_errors(true);
    let r = exact_shapley(&u, &NoProgress).unwrap();
    let outlier = r.value_of("outlier").unwrap();
    for name in ["a", "b", "c"] {
        assert!(r.value_of(name).unwrap() > outlier);
    }
}

#[test]
fn cache_is_shared_across_workers() {
    let u = ModelUtility::new(LinearRegression::new(), dataset()).cache_capacity(64);
    let config = PermutationConfig::new(40).n_jobs(4).seed(3);
    permutation_montecarlo(&u, &config, &NoProgress).unwrap();
    let stats = u.cache_stats().unwrap();
    // Only 15 non-empty subsets exist
    assert!(stats.len <= 15);
    assert!(stats.hits > 0);
}

#[test]
fn clear_cache_drops_entries() {
    let u = ModelUtility::new(LinearRegression::new(), dataset());
    u.evaluate(&Subset::new([1])).unwrap();
    assert_eq!(u.cache_stats().unwrap().len, 1);
    u.clear_cache();
    assert_eq!(u.cache_stats().unwrap().len, 0);
}

#[test]
fn with_model_starts_a_fresh_cache() {
    let u = ModelUtility::new(LinearRegression::new(), dataset());
    u.evaluate(&Subset::new([1, 2])).unwrap();
    let v = u.with_model(LinearRegression::new());
    assert_eq!(v.cache_stats().unwrap().len, 0);
    assert_eq!(v.data_names(), u.data_names());
}
