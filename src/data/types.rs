//! Core data types for market data
//!
//! - Candle: OHLCV candlestick data
//! - Sample: one feature vector with its next-period return target

use chrono::{DateTime, Utc};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// OHLCV candlestick data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Time the candle opened
    pub open_time: DateTime<Utc>,
    /// Time the candle closed
    pub close_time: DateTime<Utc>,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Trading volume (base currency)
    pub volume: f64,
}

impl Candle {
    /// Calculate the candle's total range (high - low)
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Check if the candle is bullish (close > open)
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

/// A single supervised learning example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Close time of the candle the features were computed at
    pub time: DateTime<Utc>,
    /// Feature vector, ordered as [`crate::data::features::FEATURE_NAMES`]
    pub features: Vec<f64>,
    /// Percentage return of the following period
    pub target: f64,
}

/// Separate samples into feature rows and a target vector
pub fn samples_to_xy(samples: &[Sample]) -> (Vec<Vec<f64>>, Array1<f64>) {
    let x = samples.iter().map(|s| s.features.clone()).collect();
    let y = samples.iter().map(|s| s.target).collect();
    (x, y)
}
