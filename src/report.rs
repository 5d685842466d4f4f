//! Training report output.

use crate::backtest::{BacktestResult, Signal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::Path;

/// Summary of one training and evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    pub market: String,
    pub data_source: String,
    pub symbol: String,
    pub interval: String,
    pub candles: usize,
    pub train_samples: usize,
    pub test_samples: usize,
    pub feature_names: Vec<String>,
    pub train_loss: f64,
    pub test_mse: f64,
    pub test_directional_acc: f64,
    pub backtest: BacktestResult,
    pub next_predicted_return: f64,
    pub signal: Signal,
    pub generated_at: DateTime<Utc>,
}

impl TrainReport {
    /// Human-readable summary, one metric per line
    pub fn render_text(&self, model_path: Option<&Path>) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(
            out,
            "Linear signal report [{} | {} {}]",
            self.market, self.symbol, self.interval
        );
        let _ = writeln!(out, "Data source: {}", self.data_source);
        let _ = writeln!(
            out,
            "Candles: {} | train: {} | test: {}",
            self.candles, self.train_samples, self.test_samples
        );
        let _ = writeln!(out, "Train loss: {:.8}", self.train_loss);
        let _ = writeln!(out, "Test MSE: {:.8}", self.test_mse);
        let _ = writeln!(
            out,
            "Directional accuracy: {:.2}%",
            self.test_directional_acc * 100.0
        );
        let _ = writeln!(
            out,
            "Backtest total return: {:.2}%",
            self.backtest.total_return * 100.0
        );
        let _ = writeln!(out, "Backtest win rate: {:.2}%", self.backtest.win_rate * 100.0);
        let _ = writeln!(
            out,
            "Backtest max drawdown: {:.2}%",
            self.backtest.max_drawdown * 100.0
        );
        let _ = writeln!(out, "Backtest sharpe: {:.3}", self.backtest.sharpe);
        let _ = writeln!(out, "Backtest trades: {}", self.backtest.trades);
        let _ = writeln!(
            out,
            "Predicted next return: {:.4}%",
            self.next_predicted_return * 100.0
        );
        let _ = writeln!(out, "Signal: {}", self.signal);
        if let Some(path) = model_path {
            let _ = writeln!(out, "Model saved to: {}", path.display());
        }
        out
    }
}
