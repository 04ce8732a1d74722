//! Fan-out/fan-in execution of fixed-budget estimators.
//!
//! A [`Distributor`] owns a rayon pool. The work is split into one input per
//! worker (an iteration budget with [`split_budget`] or an index range with
//! [`chunk`]), each worker produces a partial vector of statistics, and the
//! ordered partials are reduced on the calling thread.
//!
//! Worker `k` draws from the base stream of the seed advanced by `k` jumps
//! ([`worker_rng`]), so streams never overlap and a fixed `(seed, n_jobs)`
//! always gives the same estimate.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::config::ParallelConfig;
use crate::error::ValuationError;
use crate::statistics::RunningStatistic;

/// Split `total` units of work into at most `n_jobs` non-empty shares that
/// differ by at most one.
///
/// Fewer than `n_jobs` shares are returned when `total < n_jobs`; an empty
/// plan when `total == 0`.
pub fn split_budget(total: usize, n_jobs: usize) -> Vec<usize> {
    let workers = total.min(n_jobs);
    if workers == 0 {
        return Vec::new();
    }
    let base = total / workers;
    let extra = total % workers;
    (0..workers)
        .map(|k| if k < extra { base + 1 } else { base })
        .collect()
}

/// Split `items` into at most `n_jobs` contiguous, non-empty chunks whose
/// lengths differ by at most one.
pub fn chunk<T>(items: &[T], n_jobs: usize) -> Vec<&[T]> {
    let mut rest = items;
    split_budget(items.len(), n_jobs)
        .into_iter()
        .map(|len| {
            let (head, tail) = rest.split_at(len);
            rest = tail;
            head
        })
        .collect()
}

/// Random stream of worker `k`: the base stream of `seed` advanced by `k`
/// jumps of 2^128 steps.
pub fn worker_rng(seed: u64, k: usize) -> Xoshiro256PlusPlus {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    for _ in 0..k {
        rng.jump();
    }
    rng
}

/// Reduce partials that each cover every index with the exact merge.
pub fn reduce_merge(n: usize, partials: Vec<Vec<RunningStatistic>>) -> Vec<RunningStatistic> {
    let mut acc = vec![RunningStatistic::new(); n];
    for partial in &partials {
        crate::statistics::merge_all(&mut acc, partial);
    }
    acc
}

/// Reduce partials that each cover a disjoint set of indices.
///
/// Entries of a partial that the worker did not own are empty and leave the
/// aggregate unchanged. Should two partials both hold observations for an
/// index, they are merged.
pub fn reduce_disjoint(n: usize, partials: Vec<Vec<RunningStatistic>>) -> Vec<RunningStatistic> {
    let mut acc = vec![RunningStatistic::new(); n];
    for partial in partials {
        for (slot, stat) in acc.iter_mut().zip(partial) {
            if stat.is_empty() {
                continue;
            }
            if slot.is_empty() {
                *slot = stat;
            } else {
                log::debug!("overlapping partials for one index, merging");
                slot.merge(&stat);
            }
        }
    }
    acc
}

/// Rayon pool running one map job per worker.
pub struct Distributor {
    pool: ThreadPool,
    n_jobs: usize,
    seed: u64,
}

impl Distributor {
    /// Build a pool of `n_jobs` threads named `shapley-worker-{i}`.
    pub fn new(config: &ParallelConfig) -> Result<Self, ValuationError> {
        config.validate()?;
        let n_jobs = config.effective_n_jobs();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_jobs)
            .thread_name(|i| format!("shapley-worker-{i}"))
            .build()
            .map_err(|e| ValuationError::ThreadPool(e.to_string()))?;
        Ok(Self {
            pool,
            n_jobs,
            seed: config.effective_seed(),
        })
    }

    /// Number of pool threads.
    pub fn n_jobs(&self) -> usize {
        self.n_jobs
    }

    /// Base seed of the worker streams.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run `map(k, input_k)` for every input on the pool, wait for all of
    /// them, and hand the partial results, in input order, to `reduce`.
    ///
    /// If any job fails the partials are discarded and the first failure is
    /// returned as [`ValuationError::Worker`].
    pub fn map_reduce<I, T, O, M, R>(
        &self,
        inputs: Vec<I>,
        map: M,
        reduce: R,
    ) -> Result<O, ValuationError>
    where
        I: Send,
        T: Send,
        M: Fn(usize, I) -> Result<T, ValuationError> + Sync,
        R: FnOnce(Vec<T>) -> O,
    {
        let total = inputs.len();
        let results: Vec<Result<T, ValuationError>> = self.pool.install(|| {
            inputs
                .into_par_iter()
                .enumerate()
                .map(|(k, input)| {
                    log::debug!("worker {k} started");
                    let out = map(k, input);
                    log::debug!("worker {k} finished");
                    out
                })
                .collect()
        });

        let mut partials = Vec::with_capacity(total);
        let mut first_failure = None;
        let mut failed = 0;
        for (k, result) in results.into_iter().enumerate() {
            match result {
                Ok(partial) => partials.push(partial),
                Err(err) => {
                    log::warn!("worker {k} failed: {err}");
                    failed += 1;
                    if first_failure.is_none() {
                        first_failure = Some((k, err));
                    }
                }
            }
        }
        match first_failure {
            Some((worker, err)) => Err(ValuationError::Worker {
                worker,
                failed,
                total,
                source: Box::new(err),
            }),
            None => Ok(reduce(partials)),
        }
    }
}

impl std::fmt::Debug for Distributor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Distributor")
            .field("n_jobs", &self.n_jobs)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UtilityError;
    use rand::Rng;

    #[test]
    fn test_split_budget() {
        assert_eq!(split_budget(10, 3), vec![4, 3, 3]);
        assert_eq!(split_budget(9, 3), vec![3, 3, 3]);
        assert_eq!(split_budget(2, 5), vec![1, 1]);
        assert!(split_budget(0, 4).is_empty());
    }

    #[test]
    fn test_chunk() {
        let items: Vec<usize> = (0..7).collect();
        let chunks = chunk(&items, 3);
        assert_eq!(chunks, vec![&[0, 1, 2][..], &[3, 4][..], &[5, 6][..]]);
        assert!(chunk::<usize>(&[], 3).is_empty());
        assert_eq!(chunk(&items, 20).len(), 7);
    }

    #[test]
    fn test_worker_rngs_are_reproducible_and_distinct() {
        let a: u64 = worker_rng(42, 1).gen();
        let b: u64 = worker_rng(42, 1).gen();
        let c: u64 = worker_rng(42, 2).gen();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_reduce_disjoint_places_entries() {
        let mut left = vec![RunningStatistic::new(); 3];
        left[0] = RunningStatistic::from_observations([1.0, 2.0]);
        let mut right = vec![RunningStatistic::new(); 3];
        right[2] = RunningStatistic::from_observations([5.0]);
        let acc = reduce_disjoint(3, vec![left, right]);
        assert_eq!(acc[0].count(), 2);
        assert!(acc[1].is_empty());
        assert_eq!(acc[2].mean(), 5.0);
    }

    #[test]
    fn test_reduce_merge_matches_single_stream() {
        let xs = [1.0, 4.0, 2.0, 8.0, 5.0];
        let whole = RunningStatistic::from_observations(xs);
        let parts = vec![
            vec![RunningStatistic::from_observations(xs[..2].iter().copied())],
            vec![RunningStatistic::from_observations(xs[2..].iter().copied())],
        ];
        let acc = reduce_merge(1, parts);
        assert_eq!(acc[0].count(), whole.count());
        assert!((acc[0].mean() - whole.mean()).abs() < 1e-12);
        assert!((acc[0].m2() - whole.m2()).abs() < 1e-9);
    }

    #[test]
    fn test_map_reduce_preserves_order() {
        let dist = Distributor::new(&ParallelConfig::default().n_jobs(3)).unwrap();
        let out = dist
            .map_reduce(vec![1, 2, 3, 4], |k, x| Ok((k, x * 10)), |parts| parts)
            .unwrap();
        assert_eq!(out, vec![(0, 10), (1, 20), (2, 30), (3, 40)]);
    }

    #[test]
    fn test_map_reduce_reports_worker_failure() {
        let dist = Distributor::new(&ParallelConfig::default().n_jobs(2)).unwrap();
        let err = dist
            .map_reduce(
                vec![0, 1, 2],
                |k, _| {
                    if k == 1 {
                        Err(UtilityError::Fit("bad".into()).into())
                    } else {
                        Ok(k)
                    }
                },
                |parts: Vec<usize>| parts.len(),
            )
            .unwrap_err();
        match err {
            ValuationError::Worker {
                worker,
                failed,
                total,
                ..
            } => {
                assert_eq!(worker, 1);
                assert_eq!(failed, 1);
                assert_eq!(total, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let err = Distributor::new(&ParallelConfig::default().n_jobs(0)).unwrap_err();
        assert!(err.is_config());
    }
}
