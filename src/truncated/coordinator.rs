//! Aggregating side of the truncated estimator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam::channel::{Receiver, RecvTimeoutError};

use crate::config::TruncatedConfig;
use crate::error::ValuationError;
use crate::result::ValuationStatus;
use crate::statistics::{merge_all, RunningStatistic};

use super::convergence::{converged_fraction, is_converged};
use super::worker::WorkerMessage;

/// Owns the only aggregate. Merges worker reports and decides when to stop.
pub(crate) struct Coordinator<'a> {
    config: &'a TruncatedConfig,
    n_workers: usize,
    receiver: Receiver<WorkerMessage>,
    stop: Arc<AtomicBool>,
    stats: Vec<RunningStatistic>,
    permutations: usize,
    pending: Vec<(usize, Vec<RunningStatistic>)>,
}

impl<'a> Coordinator<'a> {
    pub fn new(
        config: &'a TruncatedConfig,
        n_points: usize,
        n_workers: usize,
        receiver: Receiver<WorkerMessage>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            n_workers,
            receiver,
            stop,
            stats: vec![RunningStatistic::new(); n_points],
            permutations: 0,
            pending: Vec::new(),
        }
    }

    /// Run until a terminal state, then raise the stop flag.
    ///
    /// Returns the terminal status; the aggregate is left in place for
    /// [`into_statistics`](Self::into_statistics).
    pub fn run(&mut self) -> Result<ValuationStatus, ValuationError> {
        let outcome = self.poll();
        self.stop.store(true, Ordering::Release);
        outcome
    }

    /// Merged statistics and number of merged permutations.
    pub fn into_statistics(self) -> (Vec<RunningStatistic>, usize) {
        (self.stats, self.permutations)
    }

    fn poll(&mut self) -> Result<ValuationStatus, ValuationError> {
        let mut last_check = Instant::now();
        loop {
            match self.receiver.recv_timeout(self.config.poll_interval) {
                Ok(WorkerMessage::Report {
                    worker,
                    permutations,
                    stats,
                }) => {
                    log::trace!("report from worker {worker}: {permutations} permutations");
                    self.pending.push((permutations, stats));
                }
                Ok(WorkerMessage::Failed { worker, error }) => {
                    return Err(ValuationError::Worker {
                        worker,
                        failed: 1,
                        total: self.n_workers,
                        source: Box::new(error),
                    });
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    // Every worker exited on its own; judge what was sent
                    self.merge_pending();
                    return Ok(self.check().unwrap_or(ValuationStatus::MaxIterations));
                }
            }

            if last_check.elapsed() >= self.config.coordinator_update_frequency {
                self.merge_pending();
                if let Some(status) = self.check() {
                    return Ok(status);
                }
                last_check = Instant::now();
            }
        }
    }

    fn merge_pending(&mut self) {
        for (permutations, stats) in self.pending.drain(..) {
            merge_all(&mut self.stats, &stats);
            self.permutations += permutations;
        }
    }

    /// Evaluate the stopping rule on the merged statistics.
    fn check(&self) -> Option<ValuationStatus> {
        if let Some(tolerance) = self.config.value_tolerance {
            if self.permutations > 0 {
                let fraction =
                    converged_fraction(&self.stats, &self.config.convergence, tolerance);
                log::debug!(
                    "{} permutations merged, {:.1}% of indices converged",
                    self.permutations,
                    fraction * 100.0
                );
                if is_converged(&self.stats, &self.config.convergence, tolerance) {
                    return Some(ValuationStatus::Converged);
                }
            }
        }
        match self.config.max_iterations {
            Some(max) if self.permutations >= max => Some(ValuationStatus::MaxIterations),
            _ => None,
        }
    }
}
