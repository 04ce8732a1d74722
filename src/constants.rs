//! Default values and limits used throughout the crate.

use std::time::Duration;

/// Default deterministic seed for RNG operations.
///
/// Same seed + same utility + same number of jobs = same estimate.
/// The value `0x7368_6170_6c65` is "shaple" encoded in ASCII.
pub const DEFAULT_SEED: u64 = 0x7368_6170_6c65;

/// Default number of points on the Owen sampling grid for `q`.
pub const DEFAULT_MAX_Q: usize = 100;

/// Largest number of points for which exact Shapley values are computed.
///
/// The exact computation evaluates the utility on all `2^n` subsets.
pub const MAX_EXACT_POINTS: usize = 20;

/// Largest number of points for combinatorial sampling.
///
/// Beyond it the correction `2^(n-1) / n` overflows an `f64`.
pub const MAX_COMBINATORIAL_POINTS: usize = 1_024;

/// Default capacity (number of subsets) of a utility score cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 4_096;

/// Default interval between two stopping-rule evaluations by the coordinator.
pub const DEFAULT_COORDINATOR_UPDATE_FREQUENCY: Duration = Duration::from_secs(10);

/// Default interval between two statistics reports from a worker.
pub const DEFAULT_WORKER_UPDATE_FREQUENCY: Duration = Duration::from_secs(5);

/// Longest the coordinator blocks on its inbox before re-checking its clock.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Minimum number of observations per index before its standard error is
/// trusted by a convergence check.
pub const DEFAULT_MIN_SAMPLES: usize = 2;
