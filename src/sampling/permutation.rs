//! Permutation sampling: marginals along random orderings of the data.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::ValuationError;
use crate::progress::Progress;
use crate::statistics::RunningStatistic;
use crate::types::{DataIndex, FailurePolicy, Subset};
use crate::utility::{score, universe, Utility};

/// Marginal contributions of every point along one permutation.
///
/// `marginals[k]` belongs to `permutation[k]` and equals
/// `u(prefix_k) - u(prefix_{k-1})`, with the empty prefix scoring `0.0`.
/// `stop` is checked before every utility call; if it returns `true` the walk
/// is abandoned and `None` is returned.
pub fn permutation_walk<U: Utility + ?Sized>(
    u: &U,
    permutation: &[DataIndex],
    policy: FailurePolicy,
    mut stop: impl FnMut() -> bool,
) -> Result<Option<Vec<f64>>, ValuationError> {
    let mut prefix = Subset::empty();
    let mut previous = 0.0;
    let mut marginals = Vec::with_capacity(permutation.len());
    for &i in permutation {
        if stop() {
            return Ok(None);
        }
        prefix.insert(i);
        let current = score(u, &prefix, policy)?;
        marginals.push(current - previous);
        previous = current;
    }
    Ok(Some(marginals))
}

/// Accumulate marginals over `n_permutations` random permutations.
///
/// Every permutation adds exactly one observation to every index and costs
/// `n` utility evaluations.
pub fn permutation_marginals<U, R, P>(
    u: &U,
    n_permutations: usize,
    rng: &mut R,
    policy: FailurePolicy,
    progress: &P,
) -> Result<Vec<RunningStatistic>, ValuationError>
where
    U: Utility + ?Sized,
    R: Rng + ?Sized,
    P: Progress + ?Sized,
{
    let mut order = universe(u.n_points());
    let mut stats = vec![RunningStatistic::new(); order.len()];
    for _ in 0..n_permutations {
        order.shuffle(rng);
        if let Some(marginals) = permutation_walk(u, &order, policy, || false)? {
            for (&i, m) in order.iter().zip(marginals) {
                stats[i].update(m);
            }
        }
        progress.advance(1);
    }
    Ok(stats)
}
