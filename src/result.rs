//! Valuation results.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::statistics::RunningStatistic;
use crate::types::DataIndex;

/// How a valuation run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuationStatus {
    /// Not computed yet.
    Pending,
    /// The stopping rule held, or the values are exact.
    Converged,
    /// The iteration budget was used up. Values are still valid estimates.
    MaxIterations,
    /// The run failed.
    Failed,
}

impl fmt::Display for ValuationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValuationStatus::Pending => "pending",
            ValuationStatus::Converged => "converged",
            ValuationStatus::MaxIterations => "max iterations",
            ValuationStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Direction of [`ValuationResult::sorted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Lowest value first.
    Ascending,
    /// Highest value first.
    Descending,
}

/// One data point's entry in a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueItem {
    /// Index of the point in the utility's universe.
    pub index: DataIndex,
    /// Display name of the point.
    pub name: String,
    /// Estimated value.
    pub value: f64,
    /// Standard error of the estimate.
    pub stderr: f64,
    /// Number of marginal observations behind the estimate.
    pub count: usize,
}

/// Estimated values of every data point.
///
/// The per-index arrays are fixed at construction and exposed read-only.
/// [`sorted`](Self::sorted) only changes the order in which
/// [`iter`](Self::iter) and [`get`](Self::get) visit the points.
#[derive(Debug, Clone, Serialize)]
pub struct ValuationResult {
    algorithm: String,
    status: ValuationStatus,
    values: Vec<f64>,
    stderr: Vec<f64>,
    counts: Vec<usize>,
    names: Vec<String>,
    sort: Option<SortOrder>,
    /// Visiting order; a permutation of `0..values.len()`.
    order: Vec<DataIndex>,
}

impl ValuationResult {
    /// Build a result from per-index arrays.
    ///
    /// All arrays must have the same length as `values`.
    pub fn new(
        algorithm: impl Into<String>,
        status: ValuationStatus,
        values: Vec<f64>,
        stderr: Vec<f64>,
        counts: Vec<usize>,
        names: Vec<String>,
    ) -> Result<Self, ValuationError> {
        let n = values.len();
        for (what, got) in [
            ("stderr", stderr.len()),
            ("counts", counts.len()),
            ("names", names.len()),
        ] {
            if got != n {
                return Err(ValuationError::Length {
                    what,
                    expected: n,
                    got,
                });
            }
        }
        Ok(Self {
            algorithm: algorithm.into(),
            status,
            values,
            stderr,
            counts,
            names,
            sort: None,
            order: (0..n).collect(),
        })
    }

    /// Build a result from one running statistic per index.
    pub fn from_statistics(
        algorithm: impl Into<String>,
        status: ValuationStatus,
        stats: &[RunningStatistic],
        names: Vec<String>,
    ) -> Result<Self, ValuationError> {
        Self::new(
            algorithm,
            status,
            stats.iter().map(RunningStatistic::mean).collect(),
            stats.iter().map(RunningStatistic::stderr).collect(),
            stats.iter().map(RunningStatistic::count).collect(),
            names,
        )
    }

    /// Name of the estimator that produced the values.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// How the run ended.
    pub fn status(&self) -> ValuationStatus {
        self.status
    }

    /// Values by index, regardless of sort order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Standard errors by index.
    pub fn stderr(&self) -> &[f64] {
        &self.stderr
    }

    /// Observation counts by index.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Names by index.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Indices in visiting order.
    pub fn indices(&self) -> &[DataIndex] {
        &self.order
    }

    /// Current sort order, `None` for index order.
    pub fn sort_order(&self) -> Option<SortOrder> {
        self.sort
    }

    /// Number of data points.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the result holds no points.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of all values. Approximates `u(D) - u(∅)` for Shapley values.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// The same result visited in `order` of value.
    ///
    /// Ties keep index order. `NaN` values always come last.
    pub fn sorted(mut self, order: SortOrder) -> Self {
        let values = &self.values;
        self.order
            .sort_by(|&a, &b| cmp_values(values[a], values[b], order).then(a.cmp(&b)));
        self.sort = Some(order);
        self
    }

    /// The `position`-th point in visiting order.
    pub fn get(&self, position: usize) -> Option<ValueItem> {
        self.order.get(position).map(|&i| self.item(i))
    }

    /// Value of the point called `name`.
    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.position_of(name).map(|i| self.values[i])
    }

    /// Index of the point called `name`.
    pub fn position_of(&self, name: &str) -> Option<DataIndex> {
        self.names.iter().position(|n| n == name)
    }

    /// All points in visiting order.
    pub fn iter(&self) -> impl Iterator<Item = ValueItem> + '_ {
        self.order.iter().map(|&i| self.item(i))
    }

    fn item(&self, i: DataIndex) -> ValueItem {
        ValueItem {
            index: i,
            name: self.names[i].clone(),
            value: self.values[i],
            stderr: self.stderr[i],
            count: self.counts[i],
        }
    }
}

impl fmt::Display for ValuationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({}, {} points)",
            self.algorithm,
            self.status,
            self.len()
        )?;
        let width = self.names.iter().map(String::len).max().unwrap_or(0).max(4);
        writeln!(f, "  {:<width$}  {:>12}  {:>12}", "name", "value", "stderr")?;
        for item in self.iter() {
            writeln!(
                f,
                "  {:<width$}  {:>12.6}  {:>12.6}",
                item.name, item.value, item.stderr
            )?;
        }
        Ok(())
    }
}

/// Compare two values in `order`, placing `NaN` after every number.
fn cmp_values(a: f64, b: f64, order: SortOrder) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match order {
            SortOrder::Ascending => a.total_cmp(&b),
            SortOrder::Descending => b.total_cmp(&a),
        },
    }
}
