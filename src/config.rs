//! Configuration management
//!
//! Handles loading and validation of application configuration. Values come
//! from defaults, an optional TOML/JSON file, the environment and finally
//! command-line flags, in that order.

use crate::api::MAX_KLINE_LIMIT;
use crate::backtest::BacktestConfig;
use crate::models::TrainConfig;
use crate::pipeline::PipelineSettings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding the Binance endpoint
pub const BINANCE_BASE_URL_ENV: &str = "BINANCE_BASE_URL";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Where candles come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Market {
    /// Binance spot klines
    Coin,
    /// Local OHLCV CSV file
    Stock,
}

impl Market {
    /// Parse a market name, ignoring case and surrounding whitespace
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_lowercase().as_str() {
            "coin" => Ok(Market::Coin),
            "stock" => Ok(Market::Stock),
            _ => Err(ConfigError::ValidationError(format!(
                "market must be coin or stock, got {:?}",
                name
            ))),
        }
    }

    /// Label recorded in reports for the candle source
    pub fn data_source(&self) -> &'static str {
        match self {
            Market::Coin => "binance",
            Market::Stock => "csv",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::Coin => write!(f, "coin"),
            Market::Stock => write!(f, "stock"),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Candle source
    #[serde(default)]
    pub data: DataSettings,

    /// Model training
    #[serde(default)]
    pub training: TrainingSettings,

    /// Backtest and signal thresholds
    #[serde(default)]
    pub backtest: BacktestSettings,

    /// Output options
    #[serde(default)]
    pub output: OutputSettings,
}

/// Candle source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    /// Market type (coin or stock)
    #[serde(default = "default_market")]
    pub market: String,

    /// Trading pair symbol
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Candle interval label (e.g. 15m, 1h, 1d)
    #[serde(default = "default_interval")]
    pub interval: String,

    /// CSV path for stock data
    #[serde(default)]
    pub stock_csv: Option<PathBuf>,

    /// Number of latest candles to use
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Network timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Binance endpoint override
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_market() -> String {
    "coin".to_string()
}

fn default_symbol() -> String {
    "BTCUSDT".to_string()
}

fn default_interval() -> String {
    "1h".to_string()
}

fn default_limit() -> usize {
    500
}

fn default_timeout_secs() -> u64 {
    20
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            market: default_market(),
            symbol: default_symbol(),
            interval: default_interval(),
            stock_csv: None,
            limit: default_limit(),
            timeout_secs: default_timeout_secs(),
            base_url: None,
        }
    }
}

/// Training settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSettings {
    /// Sequential train split ratio
    #[serde(default = "default_train_ratio")]
    pub train_ratio: f64,

    /// Gradient descent epochs
    #[serde(default = "default_epochs")]
    pub epochs: usize,

    /// Learning rate
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// L2 regularization
    #[serde(default = "default_l2")]
    pub l2: f64,
}

fn default_train_ratio() -> f64 {
    0.7
}

fn default_epochs() -> usize {
    800
}

fn default_learning_rate() -> f64 {
    0.03
}

fn default_l2() -> f64 {
    0.001
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            train_ratio: default_train_ratio(),
            epochs: default_epochs(),
            learning_rate: default_learning_rate(),
            l2: default_l2(),
        }
    }
}

/// Backtest settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestSettings {
    /// Predicted return threshold for BUY
    #[serde(default = "default_long_threshold")]
    pub long_threshold: f64,

    /// Predicted return threshold for SELL
    #[serde(default = "default_short_threshold")]
    pub short_threshold: f64,

    /// Transaction fee (bps)
    #[serde(default = "default_fee_bps")]
    pub fee_bps: f64,
}

fn default_long_threshold() -> f64 {
    0.0015
}

fn default_short_threshold() -> f64 {
    -0.0015
}

fn default_fee_bps() -> f64 {
    4.0
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            long_threshold: default_long_threshold(),
            short_threshold: default_short_threshold(),
            fee_bps: default_fee_bps(),
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Print the report as JSON
    #[serde(default)]
    pub json: bool,

    /// Optional path to save the trained model
    #[serde(default)]
    pub model_out: Option<PathBuf>,
}

impl AppConfig {
    /// Override the Binance endpoint from `BINANCE_BASE_URL` when set
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(BINANCE_BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.data.base_url = Some(url);
            }
        }
    }

    /// Check the combined configuration, returning the parsed market
    pub fn validate(&self) -> Result<Market, ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

        let market = Market::parse(&self.data.market)?;
        if self.data.symbol.trim().is_empty() {
            return invalid("symbol is required");
        }
        if self.data.interval.trim().is_empty() {
            return invalid("interval is required");
        }
        if self.data.limit == 0 {
            return invalid("limit must be greater than 0");
        }
        if market == Market::Coin && self.data.limit > MAX_KLINE_LIMIT {
            return invalid("limit for coin must be in range 1..1000");
        }
        if market == Market::Stock && self.stock_csv().is_none() {
            return invalid("stock_csv is required when market=stock");
        }
        let ratio = self.training.train_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return invalid("train_ratio must be in (0,1)");
        }
        if self.backtest.long_threshold <= self.backtest.short_threshold {
            return invalid("long_threshold must be greater than short_threshold");
        }
        if self.backtest.fee_bps < 0.0 {
            return invalid("fee_bps cannot be negative");
        }

        Ok(market)
    }

    /// Stock CSV path, ignoring blank values
    pub fn stock_csv(&self) -> Option<&Path> {
        self.data
            .stock_csv
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.data.timeout_secs)
    }

    pub fn train_config(&self) -> TrainConfig {
        TrainConfig {
            epochs: self.training.epochs,
            learning_rate: self.training.learning_rate,
            l2: self.training.l2,
        }
    }

    pub fn backtest_config(&self) -> BacktestConfig {
        BacktestConfig::from_fee_bps(
            self.backtest.long_threshold,
            self.backtest.short_threshold,
            self.backtest.fee_bps,
        )
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            train_ratio: self.training.train_ratio,
            train: self.train_config(),
            backtest: self.backtest_config(),
        }
    }
}

/// Load configuration from a TOML or JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    if content.trim().starts_with('{') {
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    } else {
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.data.market, "coin");
        assert_eq!(config.data.symbol, "BTCUSDT");
        assert_eq!(config.data.limit, 500);
        assert_eq!(config.training.epochs, 800);
        assert_eq!(config.backtest.fee_bps, 4.0);
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert_eq!(config.validate().unwrap(), Market::Coin);
    }

    #[test]
    fn test_load_partial_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[data]\nmarket = \"stock\"\nstock_csv = \"prices.csv\"\n\n[training]\nepochs = 100"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.data.market, "stock");
        assert_eq!(config.data.symbol, "BTCUSDT");
        assert_eq!(config.training.epochs, 100);
        assert_eq!(config.training.train_ratio, 0.7);
        assert_eq!(config.validate().unwrap(), Market::Stock);
    }

    #[test]
    fn test_load_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"backtest\": {{\"fee_bps\": 10.0}}}}").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.backtest.fee_bps, 10.0);
        assert!((config.backtest_config().fee_rate - 0.001).abs() < 1e-15);
    }

    #[test]
    fn test_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[training]\nepochs = \"many\"").unwrap();
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_validation_rules() {
        let check = |f: fn(&mut AppConfig)| {
            let mut config = AppConfig::default();
            f(&mut config);
            config.validate()
        };

        assert!(check(|c| c.data.market = " Coin ".to_string()).is_ok());
        assert!(check(|c| c.data.market = "forex".to_string()).is_err());
        assert!(check(|c| c.data.symbol = String::new()).is_err());
        assert!(check(|c| c.data.limit = 0).is_err());
        assert!(check(|c| c.data.limit = 1001).is_err());
        assert!(check(|c| {
            c.data.market = "stock".to_string();
            c.data.limit = 5000;
            c.data.stock_csv = Some(PathBuf::from("prices.csv"));
        })
        .is_ok());
        assert!(check(|c| c.data.market = "stock".to_string()).is_err());
        assert!(check(|c| c.training.train_ratio = 1.0).is_err());
        assert!(check(|c| c.backtest.long_threshold = -0.002).is_err());
        assert!(check(|c| c.backtest.fee_bps = -1.0).is_err());
    }

    #[test]
    fn test_market_parse() {
        assert_eq!(Market::parse("STOCK").unwrap(), Market::Stock);
        assert_eq!(Market::Coin.data_source(), "binance");
        assert_eq!(Market::Stock.to_string(), "stock");
    }
}
