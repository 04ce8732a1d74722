//! Capability interface for the models whose training data is valued.

use nalgebra::{DMatrix, DVector};

use crate::error::UtilityError;

/// A model that can be refitted on arbitrary subsets of its training data.
///
/// [`ModelUtility`](super::ModelUtility) clones a prototype for every
/// evaluation, so implementations only need `&mut self` during `fit` and no
/// interior mutability.
pub trait SupervisedModel: Clone + Send + Sync {
    /// Fit on features `x` (one row per point) and targets `y`.
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), UtilityError>;

    /// Predict one target per row of `x`.
    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, UtilityError>;

    /// Score the fitted model on `(x, y)`. Higher is better.
    ///
    /// Defaults to the coefficient of determination of [`predict`](Self::predict).
    fn score(&self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<f64, UtilityError> {
        let predicted = self.predict(x)?;
        Ok(r2_score(y, &predicted))
    }
}

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// With constant targets the score is `1.0` for a perfect prediction and
/// `0.0` otherwise. Empty inputs give `NaN`.
pub fn r2_score(y: &DVector<f64>, predicted: &DVector<f64>) -> f64 {
    if y.is_empty() || y.len() != predicted.len() {
        return f64::NAN;
    }
    let mean = y.mean();
    let ss_tot: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let ss_res: f64 = y.iter().zip(predicted.iter()).map(|(a, b)| (a - b).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Ordinary least squares with an intercept, solved by SVD.
///
/// Rank-deficient designs (e.g. fewer points than features) get the
/// minimum-norm solution.
#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    coefficients: Option<DVector<f64>>,
    intercept: f64,
}

impl LinearRegression {
    /// An unfitted model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fitted coefficients, if any.
    pub fn coefficients(&self) -> Option<&DVector<f64>> {
        self.coefficients.as_ref()
    }

    /// Fitted intercept.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl SupervisedModel for LinearRegression {
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(), UtilityError> {
        if x.nrows() == 0 {
            return Err(UtilityError::Fit("cannot fit on zero samples".into()));
        }
        if x.nrows() != y.len() {
            return Err(UtilityError::Fit(format!(
                "x has {} rows but y has {} entries",
                x.nrows(),
                y.len()
            )));
        }
        let design = x.clone().insert_column(0, 1.0);
        let svd = design.svd(true, true);
        let beta = svd
            .solve(y, 1e-12)
            .map_err(|e| UtilityError::Fit(e.to_string()))?;
        self.intercept = beta[0];
        self.coefficients = Some(beta.rows(1, beta.len() - 1).into_owned());
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, UtilityError> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or_else(|| UtilityError::Score("model is not fitted".into()))?;
        if x.ncols() != coefficients.len() {
            return Err(UtilityError::Score(format!(
                "expected {} features, got {}",
                coefficients.len(),
                x.ncols()
            )));
        }
        Ok(x * coefficients + DVector::from_element(x.nrows(), self.intercept))
    }
}
