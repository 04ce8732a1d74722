//! Tests for configuration validation.
//!
//! Invalid settings must be rejected before any worker is spawned or the
//! utility is evaluated.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use shapley_oracle::{
    combinatorial_montecarlo, exact_shapley, owen_sampling, permutation_montecarlo,
    truncated_montecarlo, CombinatorialConfig, ConfigError, ConvergenceCriterion, FnUtility,
    NoProgress, OwenConfig, PermutationConfig, Subset, TruncatedConfig, ValuationError,
    ValuationStatus, MAX_COMBINATORIAL_POINTS, MAX_EXACT_POINTS,
};

fn counting_utility(calls: &AtomicUsize) -> FnUtility<impl Fn(&Subset) -> f64 + Send + Sync + '_> {
    FnUtility::new(4, move |s: &Subset| {
        calls.fetch_add(1, Ordering::Relaxed);
        s.len() as f64
    })
}

fn config_error(result: Result<shapley_oracle::ValuationResult, ValuationError>) -> ConfigError {
    match result {
        Err(ValuationError::Config(err)) => err,
        Err(other) => panic!("expected a configuration error, got {other}"),
        Ok(_) => panic!("expected a configuration error, got a result"),
    }
}

// =============================================================================
// ITERATION BUDGETS
// =============================================================================

#[test]
fn permutation_zero_iterations_rejected() {
    let calls = AtomicUsize::new(0);
    let u = counting_utility(&calls);
    let err = config_error(permutation_montecarlo(&u, &PermutationConfig::new(0), &NoProgress));
    assert_eq!(err, ConfigError::ZeroIterations { what: "max_iterations" });
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn combinatorial_zero_jobs_rejected() {
    let calls = AtomicUsize::new(0);
    let u = counting_utility(&calls);
    let config = CombinatorialConfig::new(10).n_jobs(0);
    let err = config_error(combinatorial_montecarlo(&u, &config, &NoProgress));
    assert_eq!(err, ConfigError::ZeroJobs);
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn owen_zero_grid_rejected() {
    let calls = AtomicUsize::new(0);
    let u = counting_utility(&calls);
    let err = config_error(owen_sampling(&u, &OwenConfig::new(10).max_q(0), &NoProgress));
    assert_eq!(err, ConfigError::ZeroIterations { what: "max_q" });
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

// =============================================================================
// TRUNCATED STOPPING RULE
// =============================================================================

#[test]
fn truncated_requires_a_stopping_criterion() {
    let calls = AtomicUsize::new(0);
    let u = counting_utility(&calls);
    let err = config_error(truncated_montecarlo(&u, &TruncatedConfig::new(), &NoProgress));
    assert_eq!(err, ConfigError::MissingStoppingCriterion);
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn truncated_tolerance_must_be_finite() {
    let config = TruncatedConfig::new().value_tolerance(f64::NAN);
    assert!(matches!(config.validate(), Err(ConfigError::InvalidTolerance(_))));
    let config = TruncatedConfig::new().value_tolerance(f64::INFINITY);
    assert!(matches!(config.validate(), Err(ConfigError::InvalidTolerance(_))));
}

#[test]
fn truncated_zero_tolerance_is_valid() {
    let config = TruncatedConfig::new().value_tolerance(0.0);
    assert!(config.validate().is_ok());
}

#[test]
fn truncated_fraction_above_one_rejected() {
    let criterion = ConvergenceCriterion {
        min_fraction: 1.5,
        ..ConvergenceCriterion::default()
    };
    let config = TruncatedConfig::new().max_iterations(10).convergence(criterion);
    assert_eq!(config.validate(), Err(ConfigError::InvalidFraction(1.5)));
}

#[test]
fn truncated_zero_coordinator_frequency_rejected() {
    let config = TruncatedConfig::new()
        .max_iterations(10)
        .coordinator_update_frequency(Duration::ZERO);
    assert_eq!(
        config.validate(),
        Err(ConfigError::ZeroDuration {
            what: "coordinator_update_frequency"
        })
    );
}

// =============================================================================
// EXACT COMPUTATION
// =============================================================================

#[test]
fn combinatorial_limit() {
    let calls = AtomicUsize::new(0);
    let u = FnUtility::new(MAX_COMBINATORIAL_POINTS + 1, |s: &Subset| {
        calls.fetch_add(1, Ordering::Relaxed);
        s.len() as f64
    });
    let err = config_error(combinatorial_montecarlo(
        &u,
        &CombinatorialConfig::new(2).n_jobs(4),
        &NoProgress,
    ));
    assert_eq!(
        err,
        ConfigError::TooManyPoints {
            n: MAX_COMBINATORIAL_POINTS + 1,
            max: MAX_COMBINATORIAL_POINTS
        }
    );
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn combinatorial_at_limit_stays_finite() {
    let u = FnUtility::new(MAX_COMBINATORIAL_POINTS, |s: &Subset| s.len() as f64);
    let r = combinatorial_montecarlo(&u, &CombinatorialConfig::new(1).n_jobs(4), &NoProgress)
        .unwrap();
    assert_eq!(r.status(), ValuationStatus::MaxIterations);
    assert!(r.values().iter().all(|v| v.is_finite()));
    assert!(r.stderr().iter().all(|e| e.is_finite()));
}

#[test]
fn exact_limit() {
    let u = FnUtility::new(MAX_EXACT_POINTS + 1, |_: &Subset| 0.0);
    let err = config_error(exact_shapley(&u, &NoProgress));
    assert_eq!(
        err,
        ConfigError::TooManyPoints {
            n: MAX_EXACT_POINTS + 1,
            max: MAX_EXACT_POINTS
        }
    );
}

#[test]
fn defaults_are_documented_values() {
    let config = TruncatedConfig::default();
    assert_eq!(config.coordinator_update_frequency, Duration::from_secs(10));
    assert_eq!(config.worker_update_frequency, Duration::from_secs(5));
    assert_eq!(config.poll_interval, Duration::from_millis(10));
    assert_eq!(config.convergence.min_fraction, 1.0);
    assert_eq!(OwenConfig::default().max_q, 100);
}
