//! Backtesting: position simulation and signal mapping

pub mod engine;
pub mod signal;

pub use engine::{run_backtest, BacktestConfig, BacktestError, BacktestResult};
pub use signal::{signal_from_prediction, Signal};
