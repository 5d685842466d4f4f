//! End-to-end training and evaluation for one candle series
//!
//! features -> sequential split -> scaler fit on train -> gradient descent ->
//! test-set evaluation and backtest -> signal for the latest candle.

use crate::backtest::{run_backtest, signal_from_prediction, BacktestConfig, BacktestError};
use crate::data::features::{
    build_dataset, build_latest_features, feature_names, FeatureError, FEATURE_COUNT,
};
use crate::data::scaler::{ScalerError, StandardScaler};
use crate::data::split::{split_sequential, SplitError};
use crate::data::types::{samples_to_xy, Candle};
use crate::metrics::EvaluationSummary;
use crate::models::linear::{LinearModel, ModelError, TrainConfig};
use crate::report::TrainReport;
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

/// Failure of any pipeline stage
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Feature engineering failed: {0}")]
    Features(#[from] FeatureError),

    #[error("Dataset split failed: {0}")]
    Split(#[from] SplitError),

    #[error("Scaling failed: {0}")]
    Scaler(#[from] ScalerError),

    #[error("Model failed: {0}")]
    Model(#[from] ModelError),

    #[error("Backtest failed: {0}")]
    Backtest(#[from] BacktestError),
}

/// Descriptive labels for the run, copied into reports and saved models
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInfo {
    pub market: String,
    pub data_source: String,
    pub symbol: String,
    pub interval: String,
}

/// Numeric settings for one pipeline run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    /// Fraction of samples used for training
    pub train_ratio: f64,
    pub train: TrainConfig,
    /// Thresholds are shared by the backtest and the final signal
    pub backtest: BacktestConfig,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            train_ratio: 0.7,
            train: TrainConfig::default(),
            backtest: BacktestConfig::default(),
        }
    }
}

/// Report plus the fitted artifacts needed to persist or reuse the model
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub report: TrainReport,
    pub scaler: StandardScaler,
    pub model: LinearModel,
}

/// Run the full pipeline over `candles` (ascending by open time)
pub fn run_pipeline(
    candles: &[Candle],
    run_info: &RunInfo,
    settings: &PipelineSettings,
) -> Result<PipelineOutput, PipelineError> {
    info!(
        "Running pipeline for {} {} on {} candles",
        run_info.symbol,
        run_info.interval,
        candles.len()
    );

    let samples = build_dataset(candles)?;
    let (train, test) = split_sequential(&samples, settings.train_ratio)?;
    info!(
        "Built {} samples: {} train, {} test",
        samples.len(),
        train.len(),
        test.len()
    );
    if test.len() < 2 {
        warn!("Test window has {} sample(s); Sharpe will be 0", test.len());
    }

    let (train_rows, train_y) = samples_to_xy(&train);
    let (test_rows, test_y) = samples_to_xy(&test);

    let mut scaler = StandardScaler::new(FEATURE_COUNT);
    scaler.fit(&train_rows)?;
    let train_x = scaler.transform_batch(&train_rows)?;
    let test_x = scaler.transform_batch(&test_rows)?;

    let mut model = LinearModel::new(train_x.ncols());
    let stats = model.train(&train_x, &train_y, settings.train)?;
    info!(
        "Trained for {} epochs, final loss {:.8}",
        stats.epochs, stats.final_loss
    );

    let predictions = model.predict_batch(&test_x)?.to_vec();
    let actuals = test_y.to_vec();
    let evaluation = EvaluationSummary::calculate(&predictions, &actuals);
    info!(
        "Test MSE {:.8}, directional accuracy {:.2}%",
        evaluation.mse,
        evaluation.directional_accuracy * 100.0
    );

    let backtest = run_backtest(&predictions, &actuals, &settings.backtest)?;

    let latest = scaler.transform(&build_latest_features(candles)?)?;
    let next_predicted_return = model.predict(latest.view())?;
    let signal = signal_from_prediction(
        next_predicted_return,
        settings.backtest.long_threshold,
        settings.backtest.short_threshold,
    );
    info!(
        "Next predicted return {:.6}, signal {}",
        next_predicted_return, signal
    );

    let report = TrainReport {
        market: run_info.market.clone(),
        data_source: run_info.data_source.clone(),
        symbol: run_info.symbol.clone(),
        interval: run_info.interval.clone(),
        candles: candles.len(),
        train_samples: train.len(),
        test_samples: test.len(),
        feature_names: feature_names(),
        train_loss: stats.final_loss,
        test_mse: evaluation.mse,
        test_directional_acc: evaluation.directional_accuracy,
        backtest,
        next_predicted_return,
        signal,
        generated_at: Utc::now(),
    };

    Ok(PipelineOutput {
        report,
        scaler,
        model,
    })
}
