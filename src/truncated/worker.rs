//! Sampling side of the truncated estimator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::Sender;
use rand::seq::SliceRandom;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::error::ValuationError;
use crate::progress::Progress;
use crate::sampling::permutation_walk;
use crate::statistics::RunningStatistic;
use crate::types::FailurePolicy;
use crate::utility::{universe, Utility};

/// Message from a worker to the coordinator.
#[derive(Debug)]
pub(crate) enum WorkerMessage {
    /// Statistics of the permutations completed since the previous report.
    Report {
        worker: usize,
        permutations: usize,
        stats: Vec<RunningStatistic>,
    },
    /// The worker hit an error and exited.
    Failed {
        worker: usize,
        error: ValuationError,
    },
}

/// Samples permutations until told to stop, reporting periodically.
///
/// The first completed permutation is reported at once, later ones every
/// `update_every`. The stop flag is checked before every utility call. A
/// permutation interrupted half way contributes nothing.
pub(crate) struct Worker<'a, U: ?Sized, P: ?Sized> {
    pub id: usize,
    pub utility: &'a U,
    pub rng: Xoshiro256PlusPlus,
    pub policy: FailurePolicy,
    pub update_every: Duration,
    pub stop: Arc<AtomicBool>,
    pub sender: Sender<WorkerMessage>,
    pub progress: &'a P,
}

impl<U, P> Worker<'_, U, P>
where
    U: Utility + ?Sized,
    P: Progress + ?Sized,
{
    pub fn run(mut self) {
        let n = self.utility.n_points();
        let mut order = universe(n);
        let mut local = vec![RunningStatistic::new(); n];
        let mut permutations = 0;
        let mut last_report = Instant::now();
        let mut reported = false;
        log::debug!("truncated worker {} started", self.id);

        while !self.stop.load(Ordering::Acquire) {
            order.shuffle(&mut self.rng);
            let stop = &self.stop;
            match permutation_walk(self.utility, &order, self.policy, || {
                stop.load(Ordering::Acquire)
            }) {
                Ok(Some(marginals)) => {
                    for (&i, m) in order.iter().zip(marginals) {
                        local[i].update(m);
                    }
                    permutations += 1;
                    self.progress.advance(1);
                }
                Ok(None) => break,
                Err(error) => {
                    log::warn!("truncated worker {} failed: {error}", self.id);
                    // The coordinator may already be gone
                    let _ = self.sender.send(WorkerMessage::Failed {
                        worker: self.id,
                        error,
                    });
                    return;
                }
            }

            if !reported || last_report.elapsed() >= self.update_every {
                let stats = std::mem::replace(&mut local, vec![RunningStatistic::new(); n]);
                let report = WorkerMessage::Report {
                    worker: self.id,
                    permutations,
                    stats,
                };
                if self.sender.send(report).is_err() {
                    break;
                }
                permutations = 0;
                reported = true;
                last_report = Instant::now();
            }
        }
        log::debug!("truncated worker {} stopped", self.id);
    }
}
