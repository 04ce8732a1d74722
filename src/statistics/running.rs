//! Online (streaming) mean and variance using Welford's algorithm.
//!
//! A [`RunningStatistic`] absorbs one marginal contribution at a time with
//! O(1) work and memory, and two statistics accumulated independently (for
//! example by two workers) can be combined exactly with [`RunningStatistic::merge`].
//! The merge uses the pairwise update of Chan, Golub and LeVeque, so the order
//! in which partial results are reduced does not bias the aggregate.

use serde::{Deserialize, Serialize};

/// Online statistics accumulator for one data index.
///
/// # Example
///
/// ```
/// use shapley_oracle::statistics::RunningStatistic;
///
/// let mut stat = RunningStatistic::new();
/// for x in [1.0, 2.0, 3.0, 4.0, 5.0] {
///     stat.update(x);
/// }
/// assert!((stat.mean() - 3.0).abs() < 1e-12);
/// assert!((stat.variance() - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningStatistic {
    /// Number of observations.
    count: usize,
    /// Running mean.
    mean: f64,
    /// Welford's M2: sum of squared deviations from the current mean.
    m2: f64,
}

impl RunningStatistic {
    /// Create an empty accumulator.
    pub const fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
        }
    }

    /// Accumulate every observation of `values`, in order.
    pub fn from_observations(values: impl IntoIterator<Item = f64>) -> Self {
        let mut stat = Self::new();
        for x in values {
            stat.update(x);
        }
        stat
    }

    /// Add one observation and return the new `(mean, variance)`.
    ///
    /// The first observation sets the mean to `x` and the variance to zero.
    pub fn update(&mut self, x: f64) -> (f64, f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
        (self.mean, self.variance())
    }

    /// Fold `other` into `self`.
    ///
    /// Exact: merging the statistics of two contiguous chunks of a stream gives
    /// the statistic of the whole stream, up to floating-point rounding.
    pub fn merge(&mut self, other: &RunningStatistic) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let na = self.count as f64;
        let nb = other.count as f64;
        let n = na + nb;
        let delta = other.mean - self.mean;
        self.mean += delta * nb / n;
        self.m2 += other.m2 + delta * delta * na * nb / n;
        self.count += other.count;
    }

    /// Merge two statistics into a new one.
    pub fn merged(a: &RunningStatistic, b: &RunningStatistic) -> RunningStatistic {
        let mut out = *a;
        out.merge(b);
        out
    }

    /// Number of observations.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Running mean (0 if empty).
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Accumulated sum of squared deviations.
    pub fn m2(&self) -> f64 {
        self.m2
    }

    /// Population variance `m2 / count` (0 if empty).
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.m2 / self.count as f64).max(0.0)
        }
    }

    /// Bessel-corrected variance `m2 / (count - 1)` (0 if fewer than two
    /// observations).
    pub fn sample_variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64).max(0.0)
        }
    }

    /// Standard error of the mean, `sqrt(sample_variance / count)`.
    pub fn stderr(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.sample_variance() / self.count as f64).sqrt()
        }
    }

    /// Whether no observation has been recorded.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Forget all observations.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Merge `other` into `acc` index by index.
///
/// # Panics
///
/// Panics if the two slices differ in length.
pub fn merge_all(acc: &mut [RunningStatistic], other: &[RunningStatistic]) {
    assert_eq!(acc.len(), other.len(), "statistics must cover the same indices");
    for (a, b) in acc.iter_mut().zip(other) {
        a.merge(b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_pass(values: &[f64]) -> (f64, f64) {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        (mean, var)
    }

    #[test]
    fn test_first_observation() {
        let mut stat = RunningStatistic::new();
        let (mean, var) = stat.update(4.5);
        assert_eq!(mean, 4.5);
        assert_eq!(var, 0.0);
        assert_eq!(stat.count(), 1);
        assert_eq!(stat.stderr(), 0.0);
    }

    #[test]
    fn test_empty_is_safe() {
        let stat = RunningStatistic::new();
        assert_eq!(stat.variance(), 0.0);
        assert_eq!(stat.sample_variance(), 0.0);
        assert_eq!(stat.stderr(), 0.0);
        assert!(stat.is_empty());
    }

    #[test]
    fn test_matches_two_pass() {
        let values = [0.3, -1.2, 5.5, 2.0, 2.0, 7.25, -3.0];
        let stat = RunningStatistic::from_observations(values);
        let (mean, var) = two_pass(&values);
        assert!((stat.mean() - mean).abs() < 1e-12);
        assert!((stat.variance() - var).abs() < 1e-12);
        let sample_var = var * values.len() as f64 / (values.len() - 1) as f64;
        assert!((stat.sample_variance() - sample_var).abs() < 1e-12);
        assert!((stat.stderr() - (sample_var / values.len() as f64).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_large_offset_stability() {
        // Naive sum-of-squares loses all precision here
        let values: Vec<f64> = (0..1000).map(|i| 1e9 + (i % 2) as f64).collect();
        let stat = RunningStatistic::from_observations(values.iter().copied());
        assert!((stat.variance() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_merge_equals_single_pass() {
        let values: Vec<f64> = (0..50).map(|i| ((i * 37) % 11) as f64 * 0.5 - 2.0).collect();
        let full = RunningStatistic::from_observations(values.iter().copied());

        let mut acc = RunningStatistic::from_observations(values[..7].iter().copied());
        acc.merge(&RunningStatistic::from_observations(values[7..30].iter().copied()));
        acc.merge(&RunningStatistic::from_observations(values[30..].iter().copied()));

        assert_eq!(acc.count(), full.count());
        assert!((acc.mean() - full.mean()).abs() < 1e-12);
        assert!((acc.m2() - full.m2()).abs() < 1e-9);
    }

    #[test]
    fn test_merge_with_empty_is_identity() {
        let stat = RunningStatistic::from_observations([1.0, 2.0, 4.0]);
        let mut left = RunningStatistic::new();
        left.merge(&stat);
        assert_eq!(left, stat);

        let mut right = stat;
        right.merge(&RunningStatistic::new());
        assert_eq!(right, stat);
    }

    #[test]
    fn test_merge_is_commutative() {
        let a = RunningStatistic::from_observations([1.0, 3.0, 3.5]);
        let b = RunningStatistic::from_observations([-2.0, 8.0]);
        let ab = RunningStatistic::merged(&a, &b);
        let ba = RunningStatistic::merged(&b, &a);
        assert_eq!(ab.count(), ba.count());
        assert!((ab.mean() - ba.mean()).abs() < 1e-12);
        assert!((ab.m2() - ba.m2()).abs() < 1e-12);
    }

    #[test]
    fn test_merge_all() {
        let mut acc = vec![RunningStatistic::from_observations([1.0]); 2];
        let other = vec![
            RunningStatistic::from_observations([3.0]),
            RunningStatistic::new(),
        ];
        merge_all(&mut acc, &other);
        assert_eq!(acc[0].count(), 2);
        assert_eq!(acc[0].mean(), 2.0);
        assert_eq!(acc[1].count(), 1);
    }

    #[test]
    fn test_reset() {
        let mut stat = RunningStatistic::from_observations([1.0, 2.0]);
        stat.reset();
        assert!(stat.is_empty());
        assert_eq!(stat.mean(), 0.0);
    }
}
