//! Configuration value objects, one per estimator.
//!
//! Every option an estimator recognises is a documented field with a default.
//! Builder methods set fields; [`validate`](PermutationConfig::validate) is
//! called once by the estimator entry point, before any worker is spawned or
//! the utility is evaluated.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_COORDINATOR_UPDATE_FREQUENCY, DEFAULT_MAX_Q, DEFAULT_MIN_SAMPLES,
    DEFAULT_POLL_INTERVAL, DEFAULT_SEED, DEFAULT_WORKER_UPDATE_FREQUENCY,
};
use crate::error::ConfigError;
use crate::types::FailurePolicy;

// =============================================================================
// Parallelism
// =============================================================================

/// Worker pool and randomness settings shared by all estimators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Number of concurrent workers.
    ///
    /// `None` uses the available parallelism of the machine. Default: `None`.
    pub n_jobs: Option<usize>,

    /// Seed of the random streams.
    ///
    /// Worker `k` uses the base stream advanced by `k` jumps, so a fixed
    /// `(seed, n_jobs)` gives a reproducible estimate. Default: `None`
    /// (uses [`DEFAULT_SEED`]).
    pub seed: Option<u64>,
}

impl ParallelConfig {
    /// Sequential execution on one worker.
    pub fn sequential() -> Self {
        Self {
            n_jobs: Some(1),
            ..Self::default()
        }
    }

    /// Set the number of workers.
    pub fn n_jobs(mut self, n: usize) -> Self {
        self.n_jobs = Some(n);
        self
    }

    /// Set the seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of workers actually used.
    pub fn effective_n_jobs(&self) -> usize {
        self.n_jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Seed actually used.
    pub fn effective_seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    /// Check the settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_jobs == Some(0) {
            return Err(ConfigError::ZeroJobs);
        }
        Ok(())
    }
}

// =============================================================================
// Fixed-budget estimators
// =============================================================================

/// Settings of [`permutation_montecarlo`](crate::permutation_montecarlo).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermutationConfig {
    /// Total number of permutations, split across workers. Default: 1,000.
    pub max_iterations: usize,
    /// Worker pool settings.
    pub parallel: ParallelConfig,
    /// Handling of failed utility evaluations. Default: propagate.
    pub failure_policy: FailurePolicy,
}

impl Default for PermutationConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1_000,
            parallel: ParallelConfig::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl PermutationConfig {
    /// Create a configuration sampling `max_iterations` permutations.
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..Self::default()
        }
    }

    /// Set the number of workers.
    pub fn n_jobs(mut self, n: usize) -> Self {
        self.parallel.n_jobs = Some(n);
        self
    }

    /// Set the seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.parallel.seed = Some(seed);
        self
    }

    /// Set the failure policy.
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Check the settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroIterations {
                what: "max_iterations",
            });
        }
        self.parallel.validate()
    }
}

/// Settings of [`combinatorial_montecarlo`](crate::combinatorial_montecarlo).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinatorialConfig {
    /// Number of random subsets drawn for each index. Default: 1,000.
    ///
    /// Note the different meaning from the permutation estimator: the total
    /// number of utility evaluations is about `2 * n * max_iterations`.
    pub max_iterations: usize,
    /// Worker pool settings. Workers receive disjoint chunks of indices.
    pub parallel: ParallelConfig,
    /// Handling of failed utility evaluations. Default: propagate.
    pub failure_policy: FailurePolicy,
}

impl Default for CombinatorialConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1_000,
            parallel: ParallelConfig::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl CombinatorialConfig {
    /// Create a configuration drawing `max_iterations` subsets per index.
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..Self::default()
        }
    }

    /// Set the number of workers.
    pub fn n_jobs(mut self, n: usize) -> Self {
        self.parallel.n_jobs = Some(n);
        self
    }

    /// Set the seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.parallel.seed = Some(seed);
        self
    }

    /// Set the failure policy.
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Check the settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroIterations {
                what: "max_iterations",
            });
        }
        self.parallel.validate()
    }
}

/// Settings of [`owen_sampling`](crate::owen_sampling).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwenConfig {
    /// Number of subsets drawn for each value of `q`. Default: 100.
    pub max_iterations: usize,
    /// Number of points `q = k / max_q`, `k = 1..=max_q`, of the outer
    /// integration grid. Default: 100.
    pub max_q: usize,
    /// Worker pool settings. Workers receive disjoint chunks of the grid.
    pub parallel: ParallelConfig,
    /// Handling of failed utility evaluations. Default: propagate.
    pub failure_policy: FailurePolicy,
}

impl Default for OwenConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            max_q: DEFAULT_MAX_Q,
            parallel: ParallelConfig::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl OwenConfig {
    /// Create a configuration with `max_iterations` subsets per grid point.
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..Self::default()
        }
    }

    /// Set the size of the `q` grid.
    pub fn max_q(mut self, max_q: usize) -> Self {
        self.max_q = max_q;
        self
    }

    /// Set the number of workers.
    pub fn n_jobs(mut self, n: usize) -> Self {
        self.parallel.n_jobs = Some(n);
        self
    }

    /// Set the seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.parallel.seed = Some(seed);
        self
    }

    /// Set the failure policy.
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// The outer integration grid `k / max_q` for `k = 1..=max_q`.
    pub fn q_grid(&self) -> Vec<f64> {
        (1..=self.max_q)
            .map(|k| k as f64 / self.max_q as f64)
            .collect()
    }

    /// Check the settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroIterations {
                what: "max_iterations",
            });
        }
        if self.max_q == 0 {
            return Err(ConfigError::ZeroIterations { what: "max_q" });
        }
        self.parallel.validate()
    }
}

// =============================================================================
// Truncated Monte Carlo
// =============================================================================

/// Which per-index quantity is compared against the tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConvergenceCheck {
    /// `stderr_i / |mean_i| < tolerance`.
    ///
    /// A zero standard error counts as ratio 0; a zero mean with non-zero
    /// standard error never converges.
    #[default]
    RelativeStderr,
    /// `stderr_i < tolerance`.
    AbsoluteStderr,
}

/// Stopping rule of the truncated estimator's coordinator.
///
/// This is a policy, not a reproduction of a published criterion: tune it
/// to the precision the caller needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceCriterion {
    /// Quantity compared against `value_tolerance`. Default: relative.
    pub check: ConvergenceCheck,
    /// Fraction of indices that must satisfy the check. Default: 1.0 (all).
    pub min_fraction: f64,
    /// Observations an index needs before it can count as converged.
    /// Default: 2.
    pub min_samples: usize,
}

impl Default for ConvergenceCriterion {
    fn default() -> Self {
        Self {
            check: ConvergenceCheck::RelativeStderr,
            min_fraction: 1.0,
            min_samples: DEFAULT_MIN_SAMPLES,
        }
    }
}

/// Settings of [`truncated_montecarlo`](crate::truncated_montecarlo).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruncatedConfig {
    /// Stop once the convergence criterion holds with this tolerance.
    /// Default: `None`.
    pub value_tolerance: Option<f64>,
    /// Stop once this many permutations have been merged. Default: `None`.
    ///
    /// At least one of `value_tolerance` and `max_iterations` must be set.
    pub max_iterations: Option<usize>,
    /// Worker pool settings.
    pub parallel: ParallelConfig,
    /// Interval between two stopping-rule evaluations. Default: 10 s.
    pub coordinator_update_frequency: Duration,
    /// Interval between two reports of a worker. Default: 5 s.
    ///
    /// Workers never report less often than the coordinator checks; see
    /// [`worker_report_interval`](Self::worker_report_interval).
    pub worker_update_frequency: Duration,
    /// Longest the coordinator blocks on its inbox. Default: 10 ms.
    pub poll_interval: Duration,
    /// Convergence predicate.
    pub convergence: ConvergenceCriterion,
    /// Handling of failed utility evaluations. Default: propagate.
    pub failure_policy: FailurePolicy,
}

impl Default for TruncatedConfig {
    fn default() -> Self {
        Self {
            value_tolerance: None,
            max_iterations: None,
            parallel: ParallelConfig::default(),
            coordinator_update_frequency: DEFAULT_COORDINATOR_UPDATE_FREQUENCY,
            worker_update_frequency: DEFAULT_WORKER_UPDATE_FREQUENCY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            convergence: ConvergenceCriterion::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl TruncatedConfig {
    /// Create a configuration with no stopping criterion set yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the convergence tolerance.
    pub fn value_tolerance(mut self, tolerance: f64) -> Self {
        self.value_tolerance = Some(tolerance);
        self
    }

    /// Set the permutation cap.
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }

    /// Set the number of workers.
    pub fn n_jobs(mut self, n: usize) -> Self {
        self.parallel.n_jobs = Some(n);
        self
    }

    /// Set the seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.parallel.seed = Some(seed);
        self
    }

    /// Set the coordinator's evaluation interval.
    pub fn coordinator_update_frequency(mut self, every: Duration) -> Self {
        self.coordinator_update_frequency = every;
        self
    }

    /// Set the workers' reporting interval.
    pub fn worker_update_frequency(mut self, every: Duration) -> Self {
        self.worker_update_frequency = every;
        self
    }

    /// Reporting interval the workers actually use: `worker_update_frequency`
    /// capped at `coordinator_update_frequency`, so that every check sees the
    /// work done since the previous one.
    pub fn worker_report_interval(&self) -> Duration {
        self.worker_update_frequency
            .min(self.coordinator_update_frequency)
    }

    /// Set the convergence predicate.
    pub fn convergence(mut self, criterion: ConvergenceCriterion) -> Self {
        self.convergence = criterion;
        self
    }

    /// Set the failure policy.
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Check the settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.value_tolerance.is_none() && self.max_iterations.is_none() {
            return Err(ConfigError::MissingStoppingCriterion);
        }
        if let Some(tol) = self.value_tolerance {
            if !tol.is_finite() || tol < 0.0 {
                return Err(ConfigError::InvalidTolerance(tol));
            }
        }
        if self.max_iterations == Some(0) {
            return Err(ConfigError::ZeroIterations {
                what: "max_iterations",
            });
        }
        let fraction = self.convergence.min_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(ConfigError::InvalidFraction(fraction));
        }
        if self.coordinator_update_frequency.is_zero() {
            return Err(ConfigError::ZeroDuration {
                what: "coordinator_update_frequency",
            });
        }
        if self.worker_update_frequency.is_zero() {
            return Err(ConfigError::ZeroDuration {
                what: "worker_update_frequency",
            });
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroDuration {
                what: "poll_interval",
            });
        }
        self.parallel.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(PermutationConfig::default().validate().is_ok());
        assert!(CombinatorialConfig::default().validate().is_ok());
        assert!(OwenConfig::default().validate().is_ok());
        // Truncated needs a stopping criterion
        assert_eq!(
            TruncatedConfig::default().validate(),
            Err(ConfigError::MissingStoppingCriterion)
        );
    }

    #[test]
    fn test_zero_jobs_rejected() {
        assert_eq!(
            PermutationConfig::new(10).n_jobs(0).validate(),
            Err(ConfigError::ZeroJobs)
        );
    }

    #[test]
    fn test_q_grid_excludes_zero() {
        let grid = OwenConfig::new(10).max_q(4).q_grid();
        assert_eq!(grid, vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_worker_report_interval_is_capped() {
        let config = TruncatedConfig::new().coordinator_update_frequency(Duration::from_millis(200));
        assert_eq!(config.worker_report_interval(), Duration::from_millis(200));
        let config = config.worker_update_frequency(Duration::from_millis(20));
        assert_eq!(config.worker_report_interval(), Duration::from_millis(20));
    }

    #[test]
    fn test_truncated_validation() {
        assert!(TruncatedConfig::new().max_iterations(5).validate().is_ok());
        assert!(TruncatedConfig::new().value_tolerance(0.1).validate().is_ok());
        assert_eq!(
            TruncatedConfig::new().value_tolerance(-1.0).validate(),
            Err(ConfigError::InvalidTolerance(-1.0))
        );
        assert_eq!(
            TruncatedConfig::new()
                .max_iterations(5)
                .worker_update_frequency(Duration::ZERO)
                .validate(),
            Err(ConfigError::ZeroDuration {
                what: "worker_update_frequency"
            })
        );
        let criterion = ConvergenceCriterion {
            min_fraction: 0.0,
            ..ConvergenceCriterion::default()
        };
        assert_eq!(
            TruncatedConfig::new()
                .max_iterations(5)
                .convergence(criterion)
                .validate(),
            Err(ConfigError::InvalidFraction(0.0))
        );
    }

    #[test]
    fn test_effective_values() {
        let p = ParallelConfig::default();
        assert!(p.effective_n_jobs() >= 1);
        assert_eq!(p.effective_seed(), DEFAULT_SEED);
        assert_eq!(ParallelConfig::sequential().seed(9).effective_seed(), 9);
    }
}
