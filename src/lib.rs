//! # Linear Signal Crypto
//!
//! Next-period return forecasting for a single crypto pair or stock using
//! a ridge-regularized linear model, with a long/flat/short backtest that
//! turns predictions into BUY/SELL/HOLD decisions.
//!
//! ## Modules
//!
//! - `api` - Binance REST client for fetching klines
//! - `data` - Candle types, feature engineering, splitting, scaling, CSV loading
//! - `models` - Linear model trained with batch gradient descent, persistence
//! - `metrics` - Prediction quality metrics
//! - `backtest` - Position simulator and signal mapping
//! - `pipeline` - End-to-end training and evaluation run
//! - `report` - Serializable run summary
//! - `config` - Application configuration

pub mod api;
pub mod backtest;
pub mod config;
pub mod data;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod report;

pub use api::BinanceClient;
pub use backtest::engine::{run_backtest, BacktestConfig, BacktestResult};
pub use backtest::signal::{signal_from_prediction, Signal};
pub use config::AppConfig;
pub use data::features::{build_dataset, build_latest_features, feature_names};
pub use data::loader::DataLoader;
pub use data::scaler::StandardScaler;
pub use data::split::split_sequential;
pub use data::types::{Candle, Sample};
pub use metrics::regression::{directional_accuracy, mean_squared_error};
pub use models::linear::{LinearModel, TrainConfig, TrainStats};
pub use models::persistence::SavedModel;
pub use pipeline::{run_pipeline, PipelineError, PipelineOutput, PipelineSettings, RunInfo};
pub use report::TrainReport;
