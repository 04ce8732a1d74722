//! Statistical building blocks for Monte Carlo valuation.
//!
//! - Welford running mean/variance with exact parallel merge
//! - Deterministic and random powerset enumeration
//! - Hoeffding sample-size bound

mod bounds;
mod powerset;
mod running;

pub use bounds::lower_bound_hoeffding;
pub use powerset::{binomial, powerset, random_powerset, random_subset, Powerset, RandomPowerset};
pub use running::{merge_all, RunningStatistic};
