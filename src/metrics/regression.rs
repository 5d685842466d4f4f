//! Regression metrics for evaluating return predictions
//!
//! These are reporting aids: malformed input (empty or mismatched lengths)
//! yields 0 instead of an error.

use serde::{Deserialize, Serialize};

/// Mean Squared Error: (1/n) * Σ(pred - actual)²
pub fn mean_squared_error(preds: &[f64], actuals: &[f64]) -> f64 {
    if preds.is_empty() || preds.len() != actuals.len() {
        return 0.0;
    }

    preds
        .iter()
        .zip(actuals.iter())
        .map(|(&p, &a)| (p - a).powi(2))
        .sum::<f64>()
        / preds.len() as f64
}

/// Fraction of periods where prediction and actual have the same sign.
///
/// Zero has its own sign, so an exact zero only matches another exact zero.
pub fn directional_accuracy(preds: &[f64], actuals: &[f64]) -> f64 {
    if preds.is_empty() || preds.len() != actuals.len() {
        return 0.0;
    }

    let matches = preds
        .iter()
        .zip(actuals.iter())
        .filter(|(&p, &a)| sign(p) == sign(a))
        .count();

    matches as f64 / preds.len() as f64
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Summary of out-of-sample prediction quality
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Share of correctly predicted directions
    pub directional_accuracy: f64,
    /// Number of evaluated samples
    pub n_samples: usize,
}

impl EvaluationSummary {
    /// Calculate all metrics
    pub fn calculate(preds: &[f64], actuals: &[f64]) -> Self {
        let mse = mean_squared_error(preds, actuals);
        Self {
            mse,
            rmse: mse.sqrt(),
            directional_accuracy: directional_accuracy(preds, actuals),
            n_samples: preds.len().min(actuals.len()),
        }
    }
}
