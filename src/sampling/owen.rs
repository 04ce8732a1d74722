//! Owen sampling: marginals of random subsets drawn on a grid of `q`.

use rand::Rng;

use crate::error::ValuationError;
use crate::progress::Progress;
use crate::statistics::{random_subset, RunningStatistic};
use crate::types::FailurePolicy;
use crate::utility::{score, universe, Utility};

/// For every `q` in `q_values`, draw `max_subsets` subsets keeping each point
/// with probability `q`, and record `u(S ∪ {i}) - u(S)` for every `i ∉ S`.
///
/// `u(S)` is evaluated once per subset. Points already in `S` get no
/// observation from that subset.
pub fn owen_marginals<U, R, P>(
    u: &U,
    q_values: &[f64],
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
    let all = universe(u.n_points());
    let mut stats = vec![RunningStatistic::new(); all.len()];
    for &q in q_values {
        for _ in 0..max_subsets {
            let s = random_subset(&all, q, rng);
            let base = score(u, &s, policy)?;
            for &i in &all {
                if s.contains(i) {
                    continue;
                }
                let with = score(u, &s.with(i), policy)?;
                stats[i].update(with - base);
            }
        }
        progress.advance(1);
    }
    Ok(stats)
}
