//! Model evaluation metrics

pub mod regression;

pub use regression::{directional_accuracy, mean_squared_error, EvaluationSummary};
