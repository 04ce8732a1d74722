//! Train/test split backing a model utility.

use nalgebra::{DMatrix, DVector};

use crate::error::{ConfigError, UtilityError};
use crate::types::Subset;

/// A supervised dataset split into a training part, whose rows are the points
/// being valued, and a held-out test part used for scoring.
#[derive(Debug, Clone)]
pub struct Dataset {
    x_train: DMatrix<f64>,
    y_train: DVector<f64>,
    x_test: DMatrix<f64>,
    y_test: DVector<f64>,
    data_names: Vec<String>,
}

impl Dataset {
    /// Build a dataset, checking that shapes agree.
    ///
    /// Training points are named after their row index.
    pub fn new(
        x_train: DMatrix<f64>,
        y_train: DVector<f64>,
        x_test: DMatrix<f64>,
        y_test: DVector<f64>,
    ) -> Result<Self, ConfigError> {
        if x_train.nrows() != y_train.len() {
            return Err(ConfigError::ShapeMismatch {
                what: "training targets",
                expected: x_train.nrows(),
                got: y_train.len(),
            });
        }
        if x_test.nrows() != y_test.len() {
            return Err(ConfigError::ShapeMismatch {
                what: "test targets",
                expected: x_test.nrows(),
                got: y_test.len(),
            });
        }
        if x_train.ncols() != x_test.ncols() {
            return Err(ConfigError::ShapeMismatch {
                what: "test features",
                expected: x_train.ncols(),
                got: x_test.ncols(),
            });
        }
        let data_names = (0..x_train.nrows()).map(|i| i.to_string()).collect();
        Ok(Self {
            x_train,
            y_train,
            x_test,
            y_test,
            data_names,
        })
    }

    /// Replace the names of the training points.
    pub fn with_names(mut self, names: Vec<String>) -> Result<Self, ConfigError> {
        if names.len() != self.n_train() {
            return Err(ConfigError::ShapeMismatch {
                what: "data names",
                expected: self.n_train(),
                got: names.len(),
            });
        }
        self.data_names = names;
        Ok(self)
    }

    /// Number of training points.
    pub fn n_train(&self) -> usize {
        self.x_train.nrows()
    }

    /// Number of features.
    pub fn n_features(&self) -> usize {
        self.x_train.ncols()
    }

    /// Names of the training points.
    pub fn data_names(&self) -> &[String] {
        &self.data_names
    }

    /// Held-out features.
    pub fn x_test(&self) -> &DMatrix<f64> {
        &self.x_test
    }

    /// Held-out targets.
    pub fn y_test(&self) -> &DVector<f64> {
        &self.y_test
    }

    /// Full training features.
    pub fn x_train(&self) -> &DMatrix<f64> {
        &self.x_train
    }

    /// Full training targets.
    pub fn y_train(&self) -> &DVector<f64> {
        &self.y_train
    }

    /// Training rows selected by `subset`.
    pub fn train_subset(&self, subset: &Subset) -> Result<(DMatrix<f64>, DVector<f64>), UtilityError> {
        let n = self.n_train();
        if let Some(index) = subset.max_index().filter(|&i| i >= n) {
            return Err(UtilityError::IndexOutOfRange { index, n });
        }
        let rows = subset.as_slice();
        let x = self.x_train.select_rows(rows);
        let y = DVector::from_iterator(rows.len(), rows.iter().map(|&i| self.y_train[i]));
        Ok((x, y))
    }
}
