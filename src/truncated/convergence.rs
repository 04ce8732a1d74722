//! Stopping predicate of the truncated estimator.

use crate::config::{ConvergenceCheck, ConvergenceCriterion};
use crate::statistics::RunningStatistic;

/// Quantity compared against the tolerance for one index.
///
/// `None` when the index has too few observations to be judged.
fn error_measure(stat: &RunningStatistic, criterion: &ConvergenceCriterion) -> Option<f64> {
    if stat.count() < criterion.min_samples {
        return None;
    }
    let stderr = stat.stderr();
    let measure = match criterion.check {
        ConvergenceCheck::AbsoluteStderr => stderr,
        ConvergenceCheck::RelativeStderr => {
            if stderr == 0.0 {
                0.0
            } else if stat.mean() == 0.0 {
                f64::INFINITY
            } else {
                stderr / stat.mean().abs()
            }
        }
    };
    Some(measure)
}

/// Fraction of indices whose error measure is strictly below `tolerance`.
///
/// `NaN` measures never pass.
pub(crate) fn converged_fraction(
    stats: &[RunningStatistic],
    criterion: &ConvergenceCriterion,
    tolerance: f64,
) -> f64 {
    if stats.is_empty() {
        return 1.0;
    }
    let passed = stats
        .iter()
        .filter(|s| error_measure(s, criterion).is_some_and(|m| m < tolerance))
        .count();
    passed as f64 / stats.len() as f64
}

/// Whether at least `criterion.min_fraction` of the indices converged.
pub(crate) fn is_converged(
    stats: &[RunningStatistic],
    criterion: &ConvergenceCriterion,
    tolerance: f64,
) -> bool {
    converged_fraction(stats, criterion, tolerance) >= criterion.min_fraction
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(xs: &[f64]) -> RunningStatistic {
        RunningStatistic::from_observations(xs.iter().copied())
    }

    #[test]
    fn test_constant_marginals_converge_at_any_positive_tolerance() {
        let stats = vec![stat(&[1.0, 1.0, 1.0]); 3];
        let criterion = ConvergenceCriterion::default();
        assert!(is_converged(&stats, &criterion, 1e-9));
        // Strict comparison
        assert!(!is_converged(&stats, &criterion, 0.0));
    }

    #[test]
    fn test_min_samples() {
        let stats = vec![stat(&[1.0])];
        assert!(!is_converged(&stats, &ConvergenceCriterion::default(), 10.0));
    }

    #[test]
    fn test_zero_mean_never_converges_relatively() {
        let stats = vec![stat(&[-1.0, 1.0])];
        let relative = ConvergenceCriterion::default();
        assert!(!is_converged(&stats, &relative, 1e6));
        let absolute = ConvergenceCriterion {
            check: ConvergenceCheck::AbsoluteStderr,
            ..ConvergenceCriterion::default()
        };
        // stderr = sqrt(2 / 2) = 1
        assert!(is_converged(&stats, &absolute, 1.5));
    }

    #[test]
    fn test_min_fraction() {
        let stats = vec![stat(&[1.0, 1.0]), stat(&[0.0, 10.0])];
        let all = ConvergenceCriterion::default();
        let half = ConvergenceCriterion {
            min_fraction: 0.5,
            ..ConvergenceCriterion::default()
        };
        assert_eq!(converged_fraction(&stats, &all, 0.1), 0.5);
        assert!(!is_converged(&stats, &all, 0.1));
        assert!(is_converged(&stats, &half, 0.1));
    }

    #[test]
    fn test_nan_never_converges() {
        let stats = vec![stat(&[f64::NAN, 1.0])];
        assert!(!is_converged(&stats, &ConvergenceCriterion::default(), 1e9));
    }
}
