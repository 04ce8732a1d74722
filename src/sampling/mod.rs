//! Per-worker sampling loops.
//!
//! Each function runs the whole budget of one worker on one random stream and
//! returns a vector of [`RunningStatistic`](crate::statistics::RunningStatistic)
//! with one entry per data index. Indices a worker did not observe are left
//! empty. Utility failures follow the given
//! [`FailurePolicy`](crate::FailurePolicy).

mod combinatorial;
mod owen;
mod permutation;

pub use combinatorial::{combinatorial_correction, combinatorial_marginals};
pub use owen::owen_marginals;
pub use permutation::{permutation_marginals, permutation_walk};
