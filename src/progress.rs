//! Progress reporting for long valuation runs.
//!
//! Estimators call [`Progress::start`] once with the total amount of work,
//! [`Progress::advance`] from any worker as units complete, and
//! [`Progress::finish`] when the result is assembled. The unit is estimator
//! specific: permutations, subsets, or grid points.

use indicatif::{ProgressBar, ProgressStyle};

/// Sink for progress events. Shared by reference across workers.
pub trait Progress: Sync {
    /// Total number of work units, when known. `0` means unbounded.
    fn start(&self, _total: u64) {}

    /// `n` more units completed.
    fn advance(&self, _n: u64) {}

    /// The run ended, successfully or not.
    fn finish(&self) {}
}

/// Discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// Terminal progress bar.
#[derive(Debug, Clone)]
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    /// A bar labelled with `message`, e.g. the estimator name.
    pub fn new(message: impl Into<String>) -> Self {
        let bar = ProgressBar::new(0);
        // indicatif's {eta} is meaningless at position 0, so it is not shown
        match ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} | {msg}")
        {
            Ok(style) => bar.set_style(style.progress_chars("=>-")),
            Err(err) => log::debug!("falling back to default progress style: {err}"),
        }
        bar.set_message(message.into());
        Self { bar }
    }

    /// A bar that draws nothing. Useful in tests and non-interactive runs.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Units completed so far.
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Progress for BarProgress {
    fn start(&self, total: u64) {
        if total == 0 {
            self.bar.set_length(u64::MAX);
        } else {
            self.bar.set_length(total);
        }
        self.bar.set_position(0);
    }

    fn advance(&self, n: u64) {
        self.bar.inc(n);
    }

    fn finish(&self) {
        self.bar.finish();
    }
}

impl<P: Progress + ?Sized> Progress for &P {
    fn start(&self, total: u64) {
        (**self).start(total);
    }

    fn advance(&self, n: u64) {
        (**self).advance(n);
    }

    fn finish(&self) {
        (**self).finish();
    }
}
