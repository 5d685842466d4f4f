//! Per-feature standardization.
//!
//! Statistics are fitted on the training rows only and then applied
//! unchanged to test rows and live feature vectors.

use ndarray::{Array1, Array2};
use thiserror::Error;

/// Errors for the standard scaler
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScalerError {
    #[error("Cannot fit scaler on empty data")]
    EmptyData,

    #[error("Cannot fit scaler on rows with zero features")]
    ZeroDimensions,

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Invalid scaler state: {0}")]
    InvalidState(String),
}

/// Z-score scaler: `(value - mean) / std` per column
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Array1<f64>,
    stds: Array1<f64>,
}

impl StandardScaler {
    /// Create an unfitted scaler for `feature_count` columns
    pub fn new(feature_count: usize) -> Self {
        Self {
            means: Array1::zeros(feature_count),
            stds: Array1::ones(feature_count),
        }
    }

    /// Restore a fitted scaler from stored statistics
    pub fn from_parts(means: Vec<f64>, stds: Vec<f64>) -> Result<Self, ScalerError> {
        if means.len() != stds.len() {
            return Err(ScalerError::DimensionMismatch {
                expected: means.len(),
                got: stds.len(),
            });
        }
        if let Some(j) = stds.iter().position(|&s| s == 0.0 || !s.is_finite()) {
            return Err(ScalerError::InvalidState(format!(
                "std for feature {} must be finite and non-zero, got {}",
                j, stds[j]
            )));
        }

        Ok(Self {
            means: Array1::from_vec(means),
            stds: Array1::from_vec(stds),
        })
    }

    /// Fit column means and population standard deviations.
    ///
    /// Columns with zero variance get a std of 1 so they map to exactly 0.
    /// On error the previous statistics are kept.
    pub fn fit(&mut self, rows: &[Vec<f64>]) -> Result<(), ScalerError> {
        let first = rows.first().ok_or(ScalerError::EmptyData)?;
        let n_features = first.len();
        if n_features == 0 {
            return Err(ScalerError::ZeroDimensions);
        }
        if let Some(row) = rows.iter().find(|row| row.len() != n_features) {
            return Err(ScalerError::DimensionMismatch {
                expected: n_features,
                got: row.len(),
            });
        }

        let n = rows.len() as f64;

        let mut means = Array1::<f64>::zeros(n_features);
        for row in rows {
            for (j, &value) in row.iter().enumerate() {
                means[j] += value;
            }
        }
        means /= n;

        let mut stds = Array1::<f64>::zeros(n_features);
        for row in rows {
            for (j, &value) in row.iter().enumerate() {
                let diff = value - means[j];
                stds[j] += diff * diff;
            }
        }
        stds.mapv_inplace(|sum_sq| {
            let variance = sum_sq / n;
            if variance == 0.0 {
                1.0
            } else {
                variance.sqrt()
            }
        });

        self.means = means;
        self.stds = stds;
        Ok(())
    }

    /// Standardize a single feature vector
    pub fn transform(&self, row: &[f64]) -> Result<Array1<f64>, ScalerError> {
        if row.len() != self.means.len() {
            return Err(ScalerError::DimensionMismatch {
                expected: self.means.len(),
                got: row.len(),
            });
        }

        Ok(row
            .iter()
            .zip(self.means.iter().zip(self.stds.iter()))
            .map(|(&value, (&mean, &std))| (value - mean) / std)
            .collect())
    }

    /// Standardize a batch of rows into an `n_samples x n_features` matrix
    pub fn transform_batch(&self, rows: &[Vec<f64>]) -> Result<Array2<f64>, ScalerError> {
        let n_features = self.means.len();
        let mut out = Array2::<f64>::zeros((rows.len(), n_features));

        for (i, row) in rows.iter().enumerate() {
            let normalized = self.transform(row)?;
            out.row_mut(i).assign(&normalized);
        }

        Ok(out)
    }

    /// Number of features the scaler was fitted for
    pub fn feature_count(&self) -> usize {
        self.means.len()
    }

    pub fn means(&self) -> &Array1<f64> {
        &self.means
    }

    pub fn stds(&self) -> &Array1<f64> {
        &self.stds
    }
}
