//! Truncated Monte Carlo: permutation sampling until a stopping rule holds.
//!
//! Workers run on scoped OS threads and sample permutations until a shared
//! stop flag is raised. Each worker reports its first permutation at once,
//! then every `worker_update_frequency` (capped at the coordinator's
//! interval) sends the statistics gathered since its previous report over a
//! channel. The calling
//! thread acts as coordinator: it waits on the channel with a short timeout,
//! and every `coordinator_update_frequency` merges the pending reports and
//! evaluates the stopping rule.
//!
//! Cancellation is cooperative and happens between utility calls, so a
//! utility call that never returns blocks the run.

mod convergence;
mod coordinator;
mod worker;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam::channel;

use crate::config::TruncatedConfig;
use crate::error::ValuationError;
use crate::parallel::worker_rng;
use crate::progress::Progress;
use crate::result::ValuationStatus;
use crate::statistics::RunningStatistic;
use crate::utility::Utility;

use coordinator::Coordinator;
use worker::Worker;

/// Outcome of a truncated run before it is turned into a result.
pub(crate) struct TruncatedRun {
    pub stats: Vec<RunningStatistic>,
    pub status: ValuationStatus,
    pub permutations: usize,
}

/// Spawn the workers, coordinate them until a terminal state and join them.
///
/// `config` must already be validated.
pub(crate) fn run<U, P>(u: &U, config: &TruncatedConfig, progress: &P) -> Result<TruncatedRun, ValuationError>
where
    U: Utility + ?Sized,
    P: Progress + ?Sized,
{
    let n_workers = config.parallel.effective_n_jobs();
    let seed = config.parallel.effective_seed();
    let stop = Arc::new(AtomicBool::new(false));
    let (sender, receiver) = channel::unbounded();
    let mut coordinator = Coordinator::new(config, u.n_points(), n_workers, receiver, Arc::clone(&stop));

    let status = std::thread::scope(|scope| {
        for id in 0..n_workers {
            let worker = Worker {
                id,
                utility: u,
                rng: worker_rng(seed, id),
                policy: config.failure_policy,
                update_every: config.worker_report_interval(),
                stop: Arc::clone(&stop),
                sender: sender.clone(),
                progress,
            };
            let spawned = std::thread::Builder::new()
                .name(format!("shapley-worker-{id}"))
                .spawn_scoped(scope, move || worker.run());
            if let Err(err) = spawned {
                // Release the workers already running before the scope joins them
                stop.store(true, Ordering::Release);
                return Err(ValuationError::ThreadPool(err.to_string()));
            }
        }
        drop(sender);
        coordinator.run()
    })?;

    let (stats, permutations) = coordinator.into_statistics();
    Ok(TruncatedRun {
        stats,
        status,
        permutations,
    })
}
