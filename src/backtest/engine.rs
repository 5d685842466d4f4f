//! Vectorized long/short backtest driven by predicted returns.
//!
//! Each period the position is set to +1, -1 or 0 from the prediction and
//! then earns the realized return of that period. Fees are charged on
//! turnover, so flipping long to short costs twice the fee rate.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use thiserror::Error;
use tracing::info;

/// Errors for the backtest simulator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BacktestError {
    #[error("Backtest input is empty")]
    EmptyInput,

    #[error("Length mismatch: {predictions} predictions but {actuals} actual returns")]
    LengthMismatch { predictions: usize, actuals: usize },

    #[error("Long threshold {long} must be greater than short threshold {short}")]
    InvertedThresholds { long: f64, short: f64 },

    #[error("Fee rate cannot be negative, got {0}")]
    NegativeFee(f64),
}

/// Thresholds and costs for the simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Go long when the prediction is at or above this value
    pub long_threshold: f64,
    /// Go short when the prediction is at or below this value
    pub short_threshold: f64,
    /// Fee per unit of turnover, as a fraction
    pub fee_rate: f64,
}

impl BacktestConfig {
    /// Build a config with the fee given in basis points
    pub fn from_fee_bps(long_threshold: f64, short_threshold: f64, fee_bps: f64) -> Self {
        Self {
            long_threshold,
            short_threshold,
            fee_rate: fee_bps / 10_000.0,
        }
    }
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self::from_fee_bps(0.0015, -0.0015, 4.0)
    }
}

/// Outcome of a backtest run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Final equity minus one
    pub total_return: f64,
    /// Profitable periods over periods with an open position
    pub win_rate: f64,
    /// Largest peak-to-trough equity decline, as a fraction of the peak
    pub max_drawdown: f64,
    /// Per-period Sharpe scaled by sqrt(periods)
    pub sharpe: f64,
    /// Number of periods where the position changed
    pub trades: usize,
    /// Number of simulated periods
    pub periods: usize,
    /// Equity after each period
    #[serde(skip)]
    pub equity_curve: Vec<f64>,
}

struct SimState {
    position: i8,
    equity: f64,
    peak_equity: f64,
    max_drawdown: f64,
    trades: usize,
    wins: usize,
    active: usize,
    returns: Vec<f64>,
    equity_curve: Vec<f64>,
}

impl SimState {
    fn new(periods: usize) -> Self {
        Self {
            position: 0,
            equity: 1.0,
            peak_equity: 1.0,
            max_drawdown: 0.0,
            trades: 0,
            wins: 0,
            active: 0,
            returns: Vec::with_capacity(periods),
            equity_curve: Vec::with_capacity(periods),
        }
    }

    fn step(&mut self, prediction: f64, actual: f64, config: &BacktestConfig) {
        let target = target_position(prediction, config);

        let turnover = (target - self.position).unsigned_abs();
        if turnover > 0 {
            self.trades += 1;
        }

        let fee = config.fee_rate * turnover as f64;
        let period_return = target as f64 * actual - fee;

        self.equity *= 1.0 + period_return;
        if self.equity > self.peak_equity {
            self.peak_equity = self.equity;
        }
        let drawdown = (self.peak_equity - self.equity) / self.peak_equity;
        if drawdown > self.max_drawdown {
            self.max_drawdown = drawdown;
        }

        if target != 0 {
            self.active += 1;
        }
        if period_return > 0.0 {
            self.wins += 1;
        }

        self.position = target;
        self.returns.push(period_return);
        self.equity_curve.push(self.equity);
    }

    fn finish(self) -> BacktestResult {
        let win_rate = if self.active > 0 {
            self.wins as f64 / self.active as f64
        } else {
            0.0
        };

        BacktestResult {
            total_return: self.equity - 1.0,
            win_rate,
            max_drawdown: self.max_drawdown,
            sharpe: sharpe_ratio(&self.returns),
            trades: self.trades,
            periods: self.returns.len(),
            equity_curve: self.equity_curve,
        }
    }
}

fn target_position(prediction: f64, config: &BacktestConfig) -> i8 {
    if prediction >= config.long_threshold {
        1
    } else if prediction <= config.short_threshold {
        -1
    } else {
        0
    }
}

/// Sharpe of per-period returns: mean / sample std * sqrt(n).
///
/// Zero when there are fewer than two periods or no variance.
fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    if returns.iter().all(|&r| r == returns[0]) {
        return 0.0;
    }

    let mean = returns.iter().mean();
    let std_dev = returns.iter().std_dev();
    if std_dev == 0.0 || !std_dev.is_finite() {
        return 0.0;
    }

    mean / std_dev * (returns.len() as f64).sqrt()
}

/// Simulate trading `predictions` against realized `actuals`.
///
/// All inputs are validated before any period is simulated.
pub fn run_backtest(
    predictions: &[f64],
    actuals: &[f64],
    config: &BacktestConfig,
) -> Result<BacktestResult, BacktestError> {
    if predictions.is_empty() {
        return Err(BacktestError::EmptyInput);
    }
    if predictions.len() != actuals.len() {
        return Err(BacktestError::LengthMismatch {
            predictions: predictions.len(),
            actuals: actuals.len(),
        });
    }
    if config.long_threshold <= config.short_threshold {
        return Err(BacktestError::InvertedThresholds {
            long: config.long_threshold,
            short: config.short_threshold,
        });
    }
    if config.fee_rate < 0.0 {
        return Err(BacktestError::NegativeFee(config.fee_rate));
    }

    let mut state = SimState::new(predictions.len());
    for (&prediction, &actual) in predictions.iter().zip(actuals.iter()) {
        state.step(prediction, actual, config);
    }
    let result = state.finish();

    info!(
        "Backtest over {} periods: return {:.4}, trades {}, max drawdown {:.4}",
        result.periods, result.total_return, result.trades, result.max_drawdown
    );

    Ok(result)
}
