//! Shapley value estimators.
//!
//! Every entry point validates its configuration before spawning a worker or
//! evaluating the utility, and returns a [`ValuationResult`] with one value
//! per data point.
//!
//! | Estimator | Work unit | Status |
//! |---|---|---|
//! | [`permutation_montecarlo`] | permutation | `MaxIterations` |
//! | [`combinatorial_montecarlo`] | subset per index | `MaxIterations` |
//! | [`owen_sampling`] | grid point of `q` | `MaxIterations` |
//! | [`truncated_montecarlo`] | permutation | `Converged` or `MaxIterations` |
//! | [`exact_shapley`] | subset | `Converged` |

use serde::{Deserialize, Serialize};

use crate::config::{CombinatorialConfig, OwenConfig, PermutationConfig, TruncatedConfig};
use crate::constants::{MAX_COMBINATORIAL_POINTS, MAX_EXACT_POINTS};
use crate::error::{ConfigError, ValuationError};
use crate::parallel::{chunk, reduce_disjoint, reduce_merge, split_budget, worker_rng, Distributor};
use crate::progress::Progress;
use crate::result::{ValuationResult, ValuationStatus};
use crate::sampling::{
    combinatorial_correction, combinatorial_marginals, owen_marginals, permutation_marginals,
};
use crate::statistics::{binomial, powerset};
use crate::truncated;
use crate::types::{FailurePolicy, Subset};
use crate::utility::{score, universe, Utility};

/// Algorithm names reported by [`ValuationResult::algorithm`].
pub mod algorithm {
    /// [`permutation_montecarlo`](super::permutation_montecarlo).
    pub const PERMUTATION: &str = "permutation_montecarlo";
    /// [`combinatorial_montecarlo`](super::combinatorial_montecarlo).
    pub const COMBINATORIAL: &str = "combinatorial_montecarlo";
    /// [`owen_sampling`](super::owen_sampling).
    pub const OWEN: &str = "owen_sampling";
    /// [`truncated_montecarlo`](super::truncated_montecarlo).
    pub const TRUNCATED: &str = "truncated_montecarlo";
    /// [`exact_shapley`](super::exact_shapley).
    pub const EXACT: &str = "exact";
}

fn n_points<U: Utility + ?Sized>(u: &U) -> Result<usize, ConfigError> {
    match u.n_points() {
        0 => Err(ConfigError::NoPoints),
        n => Ok(n),
    }
}

fn finish<P: Progress + ?Sized>(
    progress: &P,
    result: Result<ValuationResult, ValuationError>,
) -> Result<ValuationResult, ValuationError> {
    progress.finish();
    match &result {
        Ok(r) => log::info!("{} finished: {}, sum of values {:.6}", r.algorithm(), r.status(), r.total()),
        Err(err) => log::warn!("valuation failed: {err}"),
    }
    result
}

/// Shapley values by averaging marginal contributions along random
/// permutations.
///
/// `config.max_iterations` permutations are split across the workers; each
/// costs `n` utility evaluations.
pub fn permutation_montecarlo<U, P>(
    u: &U,
    config: &PermutationConfig,
    progress: &P,
) -> Result<ValuationResult, ValuationError>
where
    U: Utility + ?Sized,
    P: Progress + ?Sized,
{
    config.validate()?;
    let n = n_points(u)?;
    let distributor = Distributor::new(&config.parallel)?;
    log::info!(
        "{}: {n} points, {} permutations on {} workers",
        algorithm::PERMUTATION,
        config.max_iterations,
        distributor.n_jobs()
    );

    progress.start(config.max_iterations as u64);
    let seed = distributor.seed();
    let policy = config.failure_policy;
    let result = distributor
        .map_reduce(
            split_budget(config.max_iterations, distributor.n_jobs()),
            |k, budget| {
                let mut rng = worker_rng(seed, k);
                permutation_marginals(u, budget, &mut rng, policy, progress)
            },
            |partials| reduce_merge(n, partials),
        )
        .and_then(|stats| {
            ValuationResult::from_statistics(
                algorithm::PERMUTATION,
                ValuationStatus::MaxIterations,
                &stats,
                u.data_names(),
            )
        });
    finish(progress, result)
}

/// Shapley values from uniformly random subsets, using the combinatorial
/// definition.
///
/// Each worker owns a disjoint chunk of the indices and draws
/// `config.max_iterations` subsets for every index in it. Values and
/// standard errors are scaled by `2^(n-1) / n` once, after reduction, which
/// limits `n` to [`MAX_COMBINATORIAL_POINTS`].
pub fn combinatorial_montecarlo<U, P>(
    u: &U,
    config: &CombinatorialConfig,
    progress: &P,
) -> Result<ValuationResult, ValuationError>
where
    U: Utility + ?Sized,
    P: Progress + ?Sized,
{
    config.validate()?;
    let n = n_points(u)?;
    if !combinatorial_correction(n).is_finite() {
        return Err(ConfigError::TooManyPoints {
            n,
            max: MAX_COMBINATORIAL_POINTS,
        }
        .into());
    }
    let distributor = Distributor::new(&config.parallel)?;
    log::info!(
        "{}: {n} points, {} subsets per point on {} workers",
        algorithm::COMBINATORIAL,
        config.max_iterations,
        distributor.n_jobs()
    );

    progress.start((n * config.max_iterations) as u64);
    let indices = universe(n);
    let seed = distributor.seed();
    let policy = config.failure_policy;
    let max_subsets = config.max_iterations;
    let result = distributor
        .map_reduce(
            chunk(&indices, distributor.n_jobs()),
            |k, owned| {
                let mut rng = worker_rng(seed, k);
                combinatorial_marginals(u, owned, max_subsets, &mut rng, policy, progress)
            },
            |partials| reduce_disjoint(n, partials),
        )
        .and_then(|stats| {
            let correction = combinatorial_correction(n);
            ValuationResult::new(
                algorithm::COMBINATORIAL,
                ValuationStatus::MaxIterations,
                stats.iter().map(|s| correction * s.mean()).collect(),
                stats.iter().map(|s| correction * s.stderr()).collect(),
                stats.iter().map(|s| s.count()).collect(),
                u.data_names(),
            )
        });
    finish(progress, result)
}

/// Shapley values from the multilinear extension, sampled on the grid
/// `q = k / max_q`, `k = 1..=max_q`.
///
/// Workers receive disjoint chunks of the grid; their statistics are merged
/// exactly. Marginals of every grid point are pooled into one mean per index.
/// Point `i` is only observed when it is left out of `S`, which happens with
/// probability `1 - q`, so grid point `q` carries weight `1 - q` rather than
/// the uniform weight of the integral over `q`. The estimate is therefore
/// exact for additive utilities but biased otherwise, and need not sum to
/// `u(D) - u(∅)`.
pub fn owen_sampling<U, P>(
    u: &U,
    config: &OwenConfig,
    progress: &P,
) -> Result<ValuationResult, ValuationError>
where
    U: Utility + ?Sized,
    P: Progress + ?Sized,
{
    config.validate()?;
    let n = n_points(u)?;
    let distributor = Distributor::new(&config.parallel)?;
    log::info!(
        "{}: {n} points, {} grid points x {} subsets on {} workers",
        algorithm::OWEN,
        config.max_q,
        config.max_iterations,
        distributor.n_jobs()
    );

    progress.start(config.max_q as u64);
    let grid = config.q_grid();
    let seed = distributor.seed();
    let policy = config.failure_policy;
    let max_subsets = config.max_iterations;
    let result = distributor
        .map_reduce(
            chunk(&grid, distributor.n_jobs()),
            |k, q_values| {
                let mut rng = worker_rng(seed, k);
                owen_marginals(u, q_values, max_subsets, &mut rng, policy, progress)
            },
            |partials| reduce_merge(n, partials),
        )
        .and_then(|stats| {
            ValuationResult::from_statistics(
                algorithm::OWEN,
                ValuationStatus::MaxIterations,
                &stats,
                u.data_names(),
            )
        });
    finish(progress, result)
}

/// Permutation sampling that stops as soon as the estimates are precise
/// enough, or after a maximum number of permutations.
///
/// See [`TruncatedConfig`] for the stopping rule. The status is
/// [`ValuationStatus::Converged`] if the convergence criterion was met and
/// [`ValuationStatus::MaxIterations`] otherwise.
pub fn truncated_montecarlo<U, P>(
    u: &U,
    config: &TruncatedConfig,
    progress: &P,
) -> Result<ValuationResult, ValuationError>
where
    U: Utility + ?Sized,
    P: Progress + ?Sized,
{
    config.validate()?;
    let n = n_points(u)?;
    log::info!(
        "{}: {n} points, tolerance {:?}, max {:?} permutations on {} workers",
        algorithm::TRUNCATED,
        config.value_tolerance,
        config.max_iterations,
        config.parallel.effective_n_jobs()
    );

    progress.start(config.max_iterations.unwrap_or(0) as u64);
    let result = truncated::run(u, config, progress).and_then(|run| {
        log::debug!("{} permutations merged", run.permutations);
        ValuationResult::from_statistics(algorithm::TRUNCATED, run.status, &run.stats, u.data_names())
    });
    finish(progress, result)
}

/// Exact Shapley values from the combinatorial definition.
///
/// Evaluates the utility on all `2^n` subsets, so `n` is limited to
/// [`MAX_EXACT_POINTS`]. Utility failures are always propagated.
pub fn exact_shapley<U, P>(u: &U, progress: &P) -> Result<ValuationResult, ValuationError>
where
    U: Utility + ?Sized,
    P: Progress + ?Sized,
{
    let n = n_points(u)?;
    if n > MAX_EXACT_POINTS {
        return Err(ConfigError::TooManyPoints {
            n,
            max: MAX_EXACT_POINTS,
        }
        .into());
    }
    log::info!("{}: {n} points, {} subsets", algorithm::EXACT, 1usize << n);

    progress.start(1u64 << n);
    let result = exact_values(u, n, progress).and_then(|values| {
        ValuationResult::new(
            algorithm::EXACT,
            ValuationStatus::Converged,
            values,
            vec![0.0; n],
            vec![1 << (n - 1); n],
            u.data_names(),
        )
    });
    finish(progress, result)
}

fn exact_values<U, P>(u: &U, n: usize, progress: &P) -> Result<Vec<f64>, ValuationError>
where
    U: Utility + ?Sized,
    P: Progress + ?Sized,
{
    let indices = universe(n);
    // Scores indexed by bitmask of the subset
    let mut scores = vec![0.0; 1 << n];
    for subset in powerset(&indices) {
        let mask = mask_of(&subset);
        scores[mask] = score(u, &subset, FailurePolicy::Propagate)?;
        progress.advance(1);
    }

    let weights: Vec<f64> = (0..n).map(|k| 1.0 / (n as f64 * binomial(n - 1, k))).collect();
    let mut values = vec![0.0; n];
    for (i, value) in values.iter_mut().enumerate() {
        let bit = 1 << i;
        *value = (0..scores.len())
            .filter(|mask| mask & bit == 0)
            .map(|mask| (scores[mask | bit] - scores[mask]) * weights[mask.count_ones() as usize])
            .sum();
    }
    Ok(values)
}

fn mask_of(subset: &Subset) -> usize {
    subset.iter().fold(0, |mask, i| mask | (1 << i))
}

/// Estimator selection for [`compute_shapley_values`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapleyMode {
    /// [`exact_shapley`].
    Exact,
    /// [`permutation_montecarlo`].
    Permutation(PermutationConfig),
    /// [`combinatorial_montecarlo`].
    Combinatorial(CombinatorialConfig),
    /// [`owen_sampling`].
    Owen(OwenConfig),
    /// [`truncated_montecarlo`].
    Truncated(TruncatedConfig),
}

/// Run the estimator selected by `mode`.
///
/// ```
/// use shapley_oracle::{compute_shapley_values, FnUtility, NoProgress, ShapleyMode, Subset};
///
/// let u = FnUtility::new(3, |s: &Subset| s.len() as f64);
/// let result = compute_shapley_values(&u, &ShapleyMode::Exact, &NoProgress).unwrap();
/// assert!(result.values().iter().all(|v| (v - 1.0).abs() < 1e-12));
/// ```
pub fn compute_shapley_values<U, P>(
    u: &U,
    mode: &ShapleyMode,
    progress: &P,
) -> Result<ValuationResult, ValuationError>
where
    U: Utility + ?Sized,
    P: Progress + ?Sized,
{
    match mode {
        ShapleyMode::Exact => exact_shapley(u, progress),
        ShapleyMode::Permutation(config) => permutation_montecarlo(u, config, progress),
        ShapleyMode::Combinatorial(config) => combinatorial_montecarlo(u, config, progress),
        ShapleyMode::Owen(config) => owen_sampling(u, config, progress),
        ShapleyMode::Truncated(config) => truncated_montecarlo(u, config, progress),
    }
}
