//! Error types for data valuation.
//!
//! Configuration problems are reported before any sampling starts. Failures of
//! the utility are either recorded as `NaN` observations or propagated,
//! depending on the [`FailurePolicy`](crate::FailurePolicy) of the run.
//! Running out of iterations without converging is not an error: it is the
//! [`ValuationStatus::MaxIterations`](crate::ValuationStatus) status.

use thiserror::Error;

use crate::types::DataIndex;

/// Result alias used across the crate.
pub type Result<T, E = ValuationError> = std::result::Result<T, E>;

/// Invalid parameter combination, detected before any work is done.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The worker pool would be empty.
    #[error("n_jobs must be > 0")]
    ZeroJobs,

    /// An iteration budget was set to zero.
    #[error("{what} must be > 0")]
    ZeroIterations {
        /// Name of the offending option.
        what: &'static str,
    },

    /// Truncated Monte Carlo needs a tolerance, an iteration cap, or both.
    #[error("at least one of value_tolerance or max_iterations must be set")]
    MissingStoppingCriterion,

    /// Tolerances must be finite and non-negative.
    #[error("value_tolerance must be finite and >= 0, got {0}")]
    InvalidTolerance(f64),

    /// Fractions must lie in `(0, 1]`.
    #[error("min_fraction must be in (0, 1], got {0}")]
    InvalidFraction(f64),

    /// A polling or reporting interval was zero.
    #[error("{what} must be a non-zero duration")]
    ZeroDuration {
        /// Name of the offending option.
        what: &'static str,
    },

    /// The index universe handed to a sampler contains repeated indices.
    #[error("repeated indices passed")]
    DuplicateIndices,

    /// An index does not belong to the utility's universe.
    #[error("index {index} out of range for {n} data points")]
    IndexOutOfRange {
        /// The offending index.
        index: DataIndex,
        /// Number of data points of the utility.
        n: usize,
    },

    /// The estimator cannot handle this many points.
    #[error("too many data points: got {n}, at most {max} supported")]
    TooManyPoints {
        /// Number of data points of the utility.
        n: usize,
        /// Largest supported number of points.
        max: usize,
    },

    /// The utility has no data points.
    #[error("the utility has no data points")]
    NoPoints,

    /// Inconsistent dataset shapes.
    #[error("shape mismatch in {what}: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Which array pair disagrees.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },
}

/// Failure of a single utility evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UtilityError {
    /// The model could not be fitted on the subset.
    #[error("model fit failed: {0}")]
    Fit(String),

    /// The fitted model could not be scored.
    #[error("model scoring failed: {0}")]
    Score(String),

    /// The subset references a point outside the dataset.
    #[error("subset index {index} out of range for {n} data points")]
    IndexOutOfRange {
        /// The offending index.
        index: DataIndex,
        /// Number of data points.
        n: usize,
    },
}

/// Top-level error of a valuation run.
#[derive(Debug, Error)]
pub enum ValuationError {
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A utility evaluation failed under [`FailurePolicy::Propagate`](crate::FailurePolicy).
    #[error("utility evaluation failed: {0}")]
    Utility(#[from] UtilityError),

    /// One or more parallel workers failed. The aggregate is discarded rather
    /// than returned with a silent gap.
    #[error("{failed} of {total} workers failed; worker {worker}: {source}")]
    Worker {
        /// Id of the first failed worker.
        worker: usize,
        /// Number of failed workers.
        failed: usize,
        /// Number of workers in the run.
        total: usize,
        /// Error reported by the first failed worker.
        #[source]
        source: Box<ValuationError>,
    },

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    /// Arrays handed to a result constructor disagree in length.
    #[error("length of {what} ({got}) does not match number of values ({expected})")]
    Length {
        /// Which array disagrees.
        what: &'static str,
        /// Number of values.
        expected: usize,
        /// Actual length.
        got: usize,
    },
}

impl ValuationError {
    /// Whether the root cause is a configuration error.
    pub fn is_config(&self) -> bool {
        match self {
            ValuationError::Config(_) => true,
            ValuationError::Worker { source, .. } => source.is_config(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ValuationError::from(ConfigError::MissingStoppingCriterion);
        assert_eq!(
            err.to_string(),
            "invalid configuration: at least one of value_tolerance or max_iterations must be set"
        );
        assert!(err.is_config());

        let err = ValuationError::Worker {
            worker: 2,
            failed: 1,
            total: 4,
            source: Box::new(UtilityError::Fit("singular matrix".into()).into()),
        };
        assert_eq!(
            err.to_string(),
            "1 of 4 workers failed; worker 2: utility evaluation failed: model fit failed: singular matrix"
        );
        assert!(!err.is_config());
    }
}
