//! Feature engineering for next-period return prediction
//!
//! Every sample is built from a short lookback window of candles ending at
//! index `i`. The feature order is fixed and shared with the scaler and the
//! model weights: position, not name, binds them at runtime.

use crate::data::types::{Candle, Sample};
use statrs::statistics::Statistics;
use thiserror::Error;
use tracing::debug;

/// Lookback window for the rolling features
pub const FEATURE_WINDOW: usize = 5;

/// Minimum number of candles needed to build at least one training sample
pub const MIN_CANDLES: usize = FEATURE_WINDOW + 2;

/// Feature names in vector order
pub const FEATURE_NAMES: [&str; 5] = ["ret_1", "mom_3", "range_ratio", "vol_change", "volatility_5"];

/// Number of features per sample
pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// Errors raised while computing features
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("Insufficient data: need at least {required} candles, got {got}")]
    InsufficientData { required: usize, got: usize },

    #[error("Division by zero computing {feature} at index {index}")]
    DivisionByZero { feature: &'static str, index: usize },

    #[error("Feature index {index} out of range for {len} candles")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Owned copy of the feature names, in vector order
pub fn feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|name| name.to_string()).collect()
}

/// Build one sample per index in `[FEATURE_WINDOW, len - 2]`.
///
/// The target of the sample at `i` is the return from `close[i]` to
/// `close[i + 1]`. A zero close or volume anywhere a denominator is needed
/// aborts the whole call.
pub fn build_dataset(candles: &[Candle]) -> Result<Vec<Sample>, FeatureError> {
    if candles.len() < MIN_CANDLES {
        return Err(FeatureError::InsufficientData {
            required: MIN_CANDLES,
            got: candles.len(),
        });
    }

    let mut samples = Vec::with_capacity(candles.len() - FEATURE_WINDOW - 1);
    for i in FEATURE_WINDOW..candles.len() - 1 {
        let features = feature_at(candles, i)?;
        let target = pct_change(candles[i + 1].close, candles[i].close).ok_or(
            FeatureError::DivisionByZero {
                feature: "target",
                index: i,
            },
        )?;

        samples.push(Sample {
            time: candles[i].close_time,
            features,
            target,
        });
    }

    debug!("Built {} samples from {} candles", samples.len(), candles.len());
    Ok(samples)
}

/// Features of the most recent candle, used for live inference
pub fn build_latest_features(candles: &[Candle]) -> Result<Vec<f64>, FeatureError> {
    let required = MIN_CANDLES - 1;
    if candles.len() < required {
        return Err(FeatureError::InsufficientData {
            required,
            got: candles.len(),
        });
    }
    feature_at(candles, candles.len() - 1)
}

/// Compute the feature vector at index `i`.
///
/// Valid for `FEATURE_WINDOW <= i < candles.len()`.
pub fn feature_at(candles: &[Candle], i: usize) -> Result<Vec<f64>, FeatureError> {
    if i < FEATURE_WINDOW || i >= candles.len() {
        return Err(FeatureError::IndexOutOfRange {
            index: i,
            len: candles.len(),
        });
    }

    let current = &candles[i];
    let previous = &candles[i - 1];
    let zero_div = |feature: &'static str| FeatureError::DivisionByZero { feature, index: i };

    let ret_1 = pct_change(current.close, previous.close).ok_or_else(|| zero_div("ret_1"))?;
    let mom_3 = pct_change(current.close, candles[i - 3].close).ok_or_else(|| zero_div("mom_3"))?;
    if current.close == 0.0 {
        return Err(zero_div("range_ratio"));
    }
    let range_ratio = current.range() / current.close;
    let vol_change =
        pct_change(current.volume, previous.volume).ok_or_else(|| zero_div("vol_change"))?;
    let volatility_5 = rolling_volatility(candles, i, FEATURE_WINDOW)?;

    Ok(vec![ret_1, mom_3, range_ratio, vol_change, volatility_5])
}

/// Population standard deviation of the `window` one-period returns ending at `end`
fn rolling_volatility(candles: &[Candle], end: usize, window: usize) -> Result<f64, FeatureError> {
    if end < window || end >= candles.len() {
        return Err(FeatureError::IndexOutOfRange {
            index: end,
            len: candles.len(),
        });
    }

    let mut returns = Vec::with_capacity(window);
    for j in end + 1 - window..=end {
        let r = pct_change(candles[j].close, candles[j - 1].close).ok_or(
            FeatureError::DivisionByZero {
                feature: "volatility_5",
                index: j,
            },
        )?;
        returns.push(r);
    }

    Ok(returns.iter().population_std_dev())
}

/// Percentage change `new / old - 1`, `None` when `old` is zero
pub fn pct_change(new_val: f64, old_val: f64) -> Option<f64> {
    if old_val == 0.0 {
        return None;
    }
    Some(new_val / old_val - 1.0)
}
