//! # shapley-oracle
//!
//! Monte Carlo estimation of Shapley values for data valuation.
//!
//! The value of a training point is its average marginal contribution to a
//! utility (typically the test score of a model refitted on a subset of the
//! training data) over all coalitions of the other points. Computing it
//! exactly takes `2^n` utility evaluations, so this crate provides sampling
//! estimators that run in parallel and report a standard error per point:
//!
//! - [`permutation_montecarlo`]: marginals along random permutations
//! - [`combinatorial_montecarlo`]: uniform random subsets weighted by binomials
//! - [`owen_sampling`]: the multilinear extension sampled on a grid of `q`
//! - [`truncated_montecarlo`]: permutation sampling with a stopping rule
//! - [`exact_shapley`]: the full sum, for small `n`
//!
//! ## Quick Start
//!
//! ```
//! use shapley_oracle::{permutation_montecarlo, FnUtility, NoProgress, PermutationConfig, Subset};
//!
//! // Every point contributes exactly one unit
//! let u = FnUtility::new(3, |s: &Subset| s.len() as f64);
//! let config = PermutationConfig::new(200).n_jobs(2).seed(42);
//! let result = permutation_montecarlo(&u, &config, &NoProgress).unwrap();
//!
//! for item in result.iter() {
//!     assert!((item.value - 1.0).abs() < 1e-9);
//! }
//! ```
//!
//! ## Model utilities
//!
//! [`ModelUtility`] values the rows of a [`Dataset`] by refitting a
//! [`SupervisedModel`] on each sampled subset and scoring it on the held-out
//! split. Scores are cached per subset.
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade and installs no logger.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod constants;
mod error;
mod progress;
mod result;
mod shapley;
mod truncated;
mod types;

// Functional modules
pub mod parallel;
pub mod sampling;
pub mod statistics;
pub mod utility;

// Re-exports for public API
pub use config::{
    CombinatorialConfig, ConvergenceCheck, ConvergenceCriterion, OwenConfig, ParallelConfig,
    PermutationConfig, TruncatedConfig,
};
pub use constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_COORDINATOR_UPDATE_FREQUENCY, DEFAULT_MAX_Q,
    DEFAULT_MIN_SAMPLES, DEFAULT_POLL_INTERVAL, DEFAULT_SEED, DEFAULT_WORKER_UPDATE_FREQUENCY,
    MAX_COMBINATORIAL_POINTS, MAX_EXACT_POINTS,
};
pub use error::{ConfigError, Result, UtilityError, ValuationError};
pub use progress::{BarProgress, NoProgress, Progress};
pub use result::{SortOrder, ValuationResult, ValuationStatus, ValueItem};
pub use shapley::{
    algorithm, combinatorial_montecarlo, compute_shapley_values, exact_shapley, owen_sampling,
    permutation_montecarlo, truncated_montecarlo, ShapleyMode,
};
pub use types::{DataIndex, FailurePolicy, Subset};
pub use utility::{Dataset, FnUtility, LinearRegression, ModelUtility, SupervisedModel, Utility};
