//! Ridge-regularized linear regression trained with batch gradient descent
//!
//! Weights and bias start at zero. Every epoch uses the full training set;
//! there is no shuffling, so training is deterministic.

use crate::metrics::regression::mean_squared_error;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Epochs used when the caller passes zero
pub const DEFAULT_EPOCHS: usize = 500;

/// Learning rate used when the caller passes a non-positive value
pub const DEFAULT_LEARNING_RATE: f64 = 0.03;

/// Errors for the linear model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Training data is empty")]
    EmptyData,

    #[error("Training rows have zero features")]
    ZeroDimensions,

    #[error("Length mismatch: {rows} rows but {targets} targets")]
    LengthMismatch { rows: usize, targets: usize },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("L2 penalty cannot be negative, got {0}")]
    NegativeL2(f64),
}

/// Gradient descent hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Number of full-batch epochs
    pub epochs: usize,
    /// Step size
    pub learning_rate: f64,
    /// Ridge penalty on the weights (bias is not penalized)
    pub l2: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: DEFAULT_EPOCHS,
            learning_rate: DEFAULT_LEARNING_RATE,
            l2: 0.0,
        }
    }
}

/// Result of a training run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainStats {
    /// Training MSE after the last epoch
    pub final_loss: f64,
    /// Epochs actually run
    pub epochs: usize,
}

/// Linear regression `bias + weights · x`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    weights: Array1<f64>,
    bias: f64,
}

impl LinearModel {
    /// Create a zero-initialized model
    pub fn new(feature_count: usize) -> Self {
        Self {
            weights: Array1::zeros(feature_count),
            bias: 0.0,
        }
    }

    /// Restore a model from stored parameters
    pub fn from_parts(weights: Vec<f64>, bias: f64) -> Self {
        Self {
            weights: Array1::from_vec(weights),
            bias,
        }
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Predict the return for one (standardized) feature vector
    pub fn predict(&self, features: ArrayView1<f64>) -> Result<f64, ModelError> {
        if features.len() != self.weights.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.weights.len(),
                got: features.len(),
            });
        }
        Ok(self.bias + self.weights.dot(&features))
    }

    /// Predict returns for every row of `x`
    pub fn predict_batch(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        if x.ncols() != self.weights.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.weights.len(),
                got: x.ncols(),
            });
        }
        Ok(x.dot(&self.weights) + self.bias)
    }

    /// Fit weights and bias with full-batch gradient descent.
    ///
    /// Per epoch:
    /// `grad_w = X'(Xw + b - y) / n + l2 * w`, `grad_b = sum(Xw + b - y) / n`.
    ///
    /// All inputs are validated before the parameters are touched. A
    /// zero epoch count or a non-positive learning rate fall back to the
    /// defaults.
    pub fn train(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        config: TrainConfig,
    ) -> Result<TrainStats, ModelError> {
        if x.nrows() == 0 {
            return Err(ModelError::EmptyData);
        }
        if x.nrows() != y.len() {
            return Err(ModelError::LengthMismatch {
                rows: x.nrows(),
                targets: y.len(),
            });
        }
        if x.ncols() == 0 {
            return Err(ModelError::ZeroDimensions);
        }
        if config.l2 < 0.0 {
            return Err(ModelError::NegativeL2(config.l2));
        }

        let epochs = if config.epochs == 0 {
            DEFAULT_EPOCHS
        } else {
            config.epochs
        };
        let learning_rate = if config.learning_rate > 0.0 {
            config.learning_rate
        } else {
            DEFAULT_LEARNING_RATE
        };

        if self.weights.len() != x.ncols() {
            self.weights = Array1::zeros(x.ncols());
        }

        let n_samples = x.nrows() as f64;

        for epoch in 0..epochs {
            let predictions = x.dot(&self.weights) + self.bias;
            let errors = &predictions - y;

            let grad_w = x.t().dot(&errors) / n_samples + &self.weights * config.l2;
            let grad_b = errors.sum() / n_samples;

            self.weights.scaled_add(-learning_rate, &grad_w);
            self.bias -= learning_rate * grad_b;

            if epoch % 100 == 0 {
                let loss = errors.mapv(|e| e * e).sum() / n_samples;
                debug!("epoch {}: mse {:.8}", epoch, loss);
            }
        }

        let predictions = x.dot(&self.weights) + self.bias;
        let final_loss = mean_squared_error(&predictions.to_vec(), &y.to_vec());

        Ok(TrainStats { final_loss, epochs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn linear_data() -> (Array2<f64>, Array1<f64>) {
        let n = 80;
        let mut x = Array2::<f64>::zeros((n, 2));
        let mut y = Array1::<f64>::zeros(n);
        for i in 0..n {
            let x1 = -1.0 + 2.0 * i as f64 / (n - 1) as f64;
            let x2 = (i as f64 * 0.7).sin();
            x[[i, 0]] = x1;
            x[[i, 1]] = x2;
            y[i] = 0.5 * x1 - 0.2 * x2 + 0.1;
        }
        (x, y)
    }

    #[test]
    fn test_train_recovers_linear_relation() {
        let (x, y) = linear_data();
        let mut model = LinearModel::new(2);
        let stats = model
            .train(
                &x,
                &y,
                TrainConfig {
                    epochs: 3000,
                    learning_rate: 0.1,
                    l2: 0.0,
                },
            )
            .unwrap();

        assert!(stats.final_loss < 1e-6, "loss {}", stats.final_loss);
        assert!((model.weights()[0] - 0.5).abs() < 1e-2);
        assert!((model.weights()[1] + 0.2).abs() < 1e-2);
        assert!((model.bias() - 0.1).abs() < 1e-2);
    }

    #[test]
    fn test_training_is_deterministic() {
        let (x, y) = linear_data();
        let config = TrainConfig {
            epochs: 200,
            learning_rate: 0.05,
            l2: 0.01,
        };

        let mut a = LinearModel::new(2);
        let mut b = LinearModel::new(2);
        let stats_a = a.train(&x, &y, config).unwrap();
        let stats_b = b.train(&x, &y, config).unwrap();

        assert_eq!(a, b);
        assert_eq!(stats_a, stats_b);
    }

    #[test]
    fn test_single_epoch_update() {
        // One epoch from zero: diff = -y, grad_w = -X'y / n, grad_b = -mean(y)
        let x = array![[1.0, 0.0], [0.0, 2.0]];
        let y = array![1.0, 2.0];
        let mut model = LinearModel::new(2);
        model
            .train(
                &x,
                &y,
                TrainConfig {
                    epochs: 1,
                    learning_rate: 0.1,
                    l2: 0.5,
                },
            )
            .unwrap();

        assert!((model.weights()[0] - 0.05).abs() < 1e-12);
        assert!((model.weights()[1] - 0.2).abs() < 1e-12);
        assert!((model.bias() - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_l2_shrinks_weights() {
        let (x, y) = linear_data();
        let config = |l2| TrainConfig {
            epochs: 1000,
            learning_rate: 0.1,
            l2,
        };

        let mut plain = LinearModel::new(2);
        plain.train(&x, &y, config(0.0)).unwrap();
        let mut ridge = LinearModel::new(2);
        ridge.train(&x, &y, config(1.0)).unwrap();

        assert!(ridge.weights()[0].abs() < plain.weights()[0].abs());
    }

    #[test]
    fn test_defaults_for_non_positive_hyperparameters() {
        let (x, y) = linear_data();
        let mut model = LinearModel::new(2);
        let stats = model
            .train(
                &x,
                &y,
                TrainConfig {
                    epochs: 0,
                    learning_rate: -1.0,
                    l2: 0.0,
                },
            )
            .unwrap();
        assert_eq!(stats.epochs, DEFAULT_EPOCHS);

        let mut reference = LinearModel::new(2);
        reference.train(&x, &y, TrainConfig::default()).unwrap();
        assert_eq!(model, reference);
    }

    #[test]
    fn test_validation_leaves_model_untouched() {
        let (x, y) = linear_data();
        let mut model = LinearModel::from_parts(vec![0.3, 0.4], 0.1);
        let before = model.clone();

        let bad_l2 = TrainConfig {
            l2: -0.1,
            ..TrainConfig::default()
        };
        assert_eq!(
            model.train(&x, &y, bad_l2).unwrap_err(),
            ModelError::NegativeL2(-0.1)
        );

        let short_y = Array1::<f64>::zeros(3);
        assert!(matches!(
            model.train(&x, &short_y, TrainConfig::default()),
            Err(ModelError::LengthMismatch { rows: 80, targets: 3 })
        ));

        let empty = Array2::<f64>::zeros((0, 2));
        assert_eq!(
            model
                .train(&empty, &Array1::zeros(0), TrainConfig::default())
                .unwrap_err(),
            ModelError::EmptyData
        );

        assert_eq!(model, before);
    }

    #[test]
    fn test_predict() {
        let model = LinearModel::from_parts(vec![2.0, -1.0], 0.5);
        let p = model.predict(array![1.0, 3.0].view()).unwrap();
        assert!((p - (-0.5)).abs() < 1e-12);

        assert!(model.predict(array![1.0].view()).is_err());

        let batch = model.predict_batch(&array![[1.0, 3.0], [0.0, 0.0]]).unwrap();
        assert_eq!(batch.to_vec(), vec![-0.5, 0.5]);
    }
}
