//! Combinatorial sampling: uniform random subsets weighted by binomials.

use std::collections::HashSet;

use rand::Rng;

use crate::error::{ConfigError, ValuationError};
use crate::progress::Progress;
use crate::statistics::{binomial, random_subset, RunningStatistic};
use crate::types::{DataIndex, FailurePolicy};
use crate::utility::{score, Utility};

/// Factor `2^(n-1) / n` turning the mean of binomial-weighted marginals into
/// a Shapley value.
pub fn combinatorial_correction(n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    2f64.powi(n as i32 - 1) / n as f64
}

/// For each index in `indices`, draw `max_subsets` uniform random subsets `S`
/// of the other points and record `(u(S ∪ {i}) - u(S)) / C(n-1, |S|)`.
///
/// The result still has to be scaled by [`combinatorial_correction`].
/// Repeated or out-of-range indices are rejected before any evaluation.
pub fn combinatorial_marginals<U, R, P>(
    u: &U,
    indices: &[DataIndex],
    max_subsets: usize,
    rng: &mut R,
    policy: FailurePolicy,
    progress: &P,
) -> Result<Vec<RunningStatistic>, ValuationError>
where
    U: Utility + ?Sized,
    R: Rng + ?Sized,
    P: Progress + ?Sized,
{
    let n = u.n_points();
    let mut seen = HashSet::with_capacity(indices.len());
    for &i in indices {
        if i >= n {
            return Err(ConfigError::IndexOutOfRange { index: i, n }.into());
        }
        if !seen.insert(i) {
            return Err(ConfigError::DuplicateIndices.into());
        }
    }

    let mut stats = vec![RunningStatistic::new(); n];
    for &i in indices {
        let others: Vec<DataIndex> = (0..n).filter(|&j| j != i).collect();
        for _ in 0..max_subsets {
            let s = random_subset(&others, 0.5, rng);
            let without = score(u, &s, policy)?;
            let with = score(u, &s.with(i), policy)?;
            stats[i].update((with - without) / binomial(n - 1, s.len()));
        }
        progress.advance(max_subsets as u64);
    }
    Ok(stats)
}
