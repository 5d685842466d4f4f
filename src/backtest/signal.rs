//! Trading signal derived from the latest predicted return.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Action suggested for the next period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        };
        write!(f, "{}", s)
    }
}

/// Map a predicted return to a signal; both thresholds are inclusive.
pub fn signal_from_prediction(prediction: f64, long_threshold: f64, short_threshold: f64) -> Signal {
    if prediction >= long_threshold {
        Signal::Buy
    } else if prediction <= short_threshold {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_boundaries() {
        assert_eq!(signal_from_prediction(0.0015, 0.0015, -0.0015), Signal::Buy);
        assert_eq!(signal_from_prediction(-0.0015, 0.0015, -0.0015), Signal::Sell);
        assert_eq!(signal_from_prediction(0.0014, 0.0015, -0.0015), Signal::Hold);
        assert_eq!(signal_from_prediction(-0.0014, 0.0015, -0.0015), Signal::Hold);
        assert_eq!(signal_from_prediction(0.5, 0.0015, -0.0015), Signal::Buy);
    }

    #[test]
    fn test_signal_serialization() {
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"BUY\"");
        assert_eq!(serde_json::to_string(&Signal::Hold).unwrap(), "\"HOLD\"");
        let parsed: Signal = serde_json::from_str("\"SELL\"").unwrap();
        assert_eq!(parsed, Signal::Sell);
        assert_eq!(Signal::Sell.to_string(), "SELL");
    }
}
