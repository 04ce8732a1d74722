//! Utility functions: the black box being valued.
//!
//! A utility maps a coalition of training points to a scalar score, typically
//! "validation score after refitting the model on that subset". Estimators
//! only ever see the [`Utility`] trait; they share one utility by reference
//! across all workers and never mutate it.
//!
//! Two implementations are provided:
//! - [`FnUtility`] wraps a plain closure (synthetic games, tests)
//! - [`ModelUtility`] fits a [`SupervisedModel`] on the subset's rows of a
//!   [`Dataset`] and scores it on the held-out split, with an optional
//!   bounded [`UtilityCache`]

mod cache;
mod dataset;
mod model;
mod model_utility;

pub use cache::{CacheStats, UtilityCache};
pub use dataset::Dataset;
pub use model::{r2_score, LinearRegression, SupervisedModel};
pub use model_utility::ModelUtility;

use std::fmt;

use crate::error::UtilityError;
use crate::types::{DataIndex, FailurePolicy, Subset};

/// A score for every coalition of `n_points()` data points.
///
/// Implementations must be pure with respect to their underlying data and
/// model: the same subset always yields the same score (up to the model's own
/// randomness). The empty subset scores `0.0` by convention; estimators never
/// call `evaluate` on it.
pub trait Utility: Send + Sync {
    /// Size of the index universe `0..n`.
    fn n_points(&self) -> usize;

    /// Score a coalition.
    fn evaluate(&self, subset: &Subset) -> Result<f64, UtilityError>;

    /// Display names of the data points, one per index.
    fn data_names(&self) -> Vec<String> {
        (0..self.n_points()).map(|i| i.to_string()).collect()
    }
}

impl<U: Utility + ?Sized> Utility for &U {
    fn n_points(&self) -> usize {
        (**self).n_points()
    }

    fn evaluate(&self, subset: &Subset) -> Result<f64, UtilityError> {
        (**self).evaluate(subset)
    }

    fn data_names(&self) -> Vec<String> {
        (**self).data_names()
    }
}

/// Utility backed by a closure over subsets.
///
/// ```
/// use shapley_oracle::{FnUtility, Subset, Utility};
///
/// let u = FnUtility::new(3, |s: &Subset| s.len() as f64);
/// assert_eq!(u.evaluate(&Subset::new([0, 2])).unwrap(), 2.0);
/// ```
pub struct FnUtility<F> {
    n: usize,
    f: F,
    names: Option<Vec<String>>,
}

impl<F> FnUtility<F>
where
    F: Fn(&Subset) -> f64 + Send + Sync,
{
    /// Wrap `f` as a utility over `n` points.
    pub fn new(n: usize, f: F) -> Self {
        Self { n, f, names: None }
    }

    /// Attach display names to the points.
    ///
    /// # Panics
    ///
    /// Panics if the number of names differs from the number of points.
    pub fn with_names(mut self, names: Vec<String>) -> Self {
        assert_eq!(names.len(), self.n, "one name per data point is required");
        self.names = Some(names);
        self
    }
}

impl<F> Utility for FnUtility<F>
where
    F: Fn(&Subset) -> f64 + Send + Sync,
{
    fn n_points(&self) -> usize {
        self.n
    }

    fn evaluate(&self, subset: &Subset) -> Result<f64, UtilityError> {
        if let Some(index) = subset.max_index().filter(|&i| i >= self.n) {
            return Err(UtilityError::IndexOutOfRange { index, n: self.n });
        }
        Ok((self.f)(subset))
    }

    fn data_names(&self) -> Vec<String> {
        match &self.names {
            Some(names) => names.clone(),
            None => (0..self.n).map(|i| i.to_string()).collect(),
        }
    }
}

impl<F> fmt::Debug for FnUtility<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnUtility").field("n", &self.n).finish_non_exhaustive()
    }
}

/// Evaluate `u` on `subset`, applying the empty-set convention and the
/// failure policy.
///
/// Under [`FailurePolicy::RecordNan`] a failed evaluation becomes `NaN`; under
/// [`FailurePolicy::Propagate`] the error is returned.
pub(crate) fn score<U: Utility + ?Sized>(
    u: &U,
    subset: &Subset,
    policy: FailurePolicy,
) -> Result<f64, UtilityError> {
    if subset.is_empty() {
        return Ok(0.0);
    }
    match u.evaluate(subset) {
        Ok(value) => Ok(value),
        Err(err) => match policy {
            FailurePolicy::Propagate => Err(err),
            FailurePolicy::RecordNan => {
                log::warn!("utility failed on subset of size {}: {err}; recording NaN", subset.len());
                Ok(f64::NAN)
            }
        },
    }
}

/// The full index universe `0..n` as a vector.
pub(crate) fn universe(n: usize) -> Vec<DataIndex> {
    (0..n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl Utility for Failing {
        fn n_points(&self) -> usize {
            2
        }

        fn evaluate(&self, _subset: &Subset) -> Result<f64, UtilityError> {
            Err(UtilityError::Fit("boom".into()))
        }
    }

    #[test]
    fn test_fn_utility_rejects_out_of_range() {
        let u = FnUtility::new(2, |s: &Subset| s.len() as f64);
        let err = u.evaluate(&Subset::new([0, 5])).unwrap_err();
        assert_eq!(err, UtilityError::IndexOutOfRange { index: 5, n: 2 });
    }

    #[test]
    fn test_default_names() {
        let u = FnUtility::new(3, |_: &Subset| 0.0);
        assert_eq!(u.data_names(), vec!["0", "1", "2"]);
        let u = u.with_names(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(u.data_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_score_empty_is_zero() {
        // Never reaches the failing utility
        assert_eq!(score(&Failing, &Subset::empty(), FailurePolicy::Propagate), Ok(0.0));
    }

    #[test]
    fn test_score_policies() {
        let s = Subset::new([0]);
        assert!(score(&Failing, &s, FailurePolicy::Propagate).is_err());
        assert!(score(&Failing, &s, FailurePolicy::RecordNan).unwrap().is_nan());
    }

    #[test]
    fn test_reference_forwarding() {
        let u = FnUtility::new(4, |s: &Subset| s.len() as f64 * 2.0);
        let r = &u;
        assert_eq!(r.n_points(), 4);
        assert_eq!(Utility::evaluate(&r, &Subset::new([1, 2])).unwrap(), 4.0);
    }
}
