//! Linear Signal - next-period return forecasting from the command line
//!
//! ```bash
//! linear_signal train --symbol ETHUSDT --interval 4h --json
//! linear_signal train --market stock --stock-csv data/aapl.csv --model-out model.json
//! linear_signal predict --model model.json --symbol ETHUSDT --interval 4h
//! linear_signal fetch --symbol BTCUSDT --limit 1000 --output btc.csv
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use linear_signal_crypto::config::{load_config, AppConfig, Market};
use linear_signal_crypto::data::features::build_latest_features;
use linear_signal_crypto::{
    run_pipeline, signal_from_prediction, BinanceClient, Candle, DataLoader, RunInfo, SavedModel,
    Signal,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "linear_signal")]
#[command(about = "Linear return forecasting with a long/flat/short backtest")]
struct Cli {
    /// Optional TOML or JSON config file; flags override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train, evaluate and backtest the model, then print the latest signal
    Train {
        #[command(flatten)]
        data: DataArgs,

        /// Sequential train split ratio
        #[arg(long)]
        train_ratio: Option<f64>,

        /// Training epochs
        #[arg(long)]
        epochs: Option<usize>,

        /// Learning rate
        #[arg(long)]
        lr: Option<f64>,

        /// L2 regularization
        #[arg(long)]
        l2: Option<f64>,

        #[command(flatten)]
        thresholds: ThresholdArgs,

        /// Transaction fee in basis points
        #[arg(long)]
        fee_bps: Option<f64>,

        /// Print output as JSON
        #[arg(long)]
        json: bool,

        /// File path to save the trained model JSON
        #[arg(long)]
        model_out: Option<PathBuf>,
    },

    /// Score the latest candle with a saved model
    Predict {
        /// Saved model JSON
        #[arg(short, long)]
        model: PathBuf,

        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        thresholds: ThresholdArgs,

        /// Print output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch Binance klines and save them as CSV
    Fetch {
        /// Trading pair symbol
        #[arg(short, long)]
        symbol: Option<String>,

        /// Candle interval (e.g. 15m, 1h, 1d)
        #[arg(short, long)]
        interval: Option<String>,

        /// Number of candles to fetch (max 1000)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Candle source flags shared by commands
#[derive(Args)]
struct DataArgs {
    /// Market type: coin | stock
    #[arg(long)]
    market: Option<String>,

    /// Trading pair symbol
    #[arg(short, long)]
    symbol: Option<String>,

    /// Candle interval label (e.g. 15m, 1h, 1d)
    #[arg(short, long)]
    interval: Option<String>,

    /// CSV path for stock OHLCV data when market=stock
    #[arg(long)]
    stock_csv: Option<PathBuf>,

    /// Number of latest candles to use
    #[arg(short, long)]
    limit: Option<usize>,

    /// Network timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

impl DataArgs {
    fn apply(self, config: &mut AppConfig) {
        if let Some(market) = self.market {
            config.data.market = market;
        }
        if let Some(symbol) = self.symbol {
            config.data.symbol = symbol;
        }
        if let Some(interval) = self.interval {
            config.data.interval = interval;
        }
        if let Some(path) = self.stock_csv {
            config.data.stock_csv = Some(path);
        }
        if let Some(limit) = self.limit {
            config.data.limit = limit;
        }
        if let Some(timeout) = self.timeout {
            config.data.timeout_secs = timeout;
        }
    }
}

/// Signal threshold flags
#[derive(Args)]
struct ThresholdArgs {
    /// Predicted return threshold for BUY
    #[arg(long, allow_hyphen_values = true)]
    long_threshold: Option<f64>,

    /// Predicted return threshold for SELL
    #[arg(long, allow_hyphen_values = true)]
    short_threshold: Option<f64>,
}

impl ThresholdArgs {
    fn apply(self, config: &mut AppConfig) {
        if let Some(long) = self.long_threshold {
            config.backtest.long_threshold = long;
        }
        if let Some(short) = self.short_threshold {
            config.backtest.short_threshold = short;
        }
    }
}

#[derive(Serialize)]
struct PredictionOutput {
    symbol: String,
    interval: String,
    candle_close_time: chrono::DateTime<chrono::Utc>,
    predicted_return: f64,
    signal: Signal,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so JSON output stays clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => AppConfig::default(),
    };
    config.apply_env_overrides();

    match cli.command {
        Commands::Train {
            data,
            train_ratio,
            epochs,
            lr,
            l2,
            thresholds,
            fee_bps,
            json,
            model_out,
        } => {
            data.apply(&mut config);
            thresholds.apply(&mut config);
            if let Some(ratio) = train_ratio {
                config.training.train_ratio = ratio;
            }
            if let Some(epochs) = epochs {
                config.training.epochs = epochs;
            }
            if let Some(lr) = lr {
                config.training.learning_rate = lr;
            }
            if let Some(l2) = l2 {
                config.training.l2 = l2;
            }
            if let Some(fee_bps) = fee_bps {
                config.backtest.fee_bps = fee_bps;
            }
            if json {
                config.output.json = true;
            }
            if model_out.is_some() {
                config.output.model_out = model_out;
            }

            train(&config).await?;
        }
        Commands::Predict {
            model,
            data,
            thresholds,
            json,
        } => {
            data.apply(&mut config);
            thresholds.apply(&mut config);
            if json {
                config.output.json = true;
            }

            predict(&config, &model).await?;
        }
        Commands::Fetch {
            symbol,
            interval,
            limit,
            output,
        } => {
            config.data.market = Market::Coin.to_string();
            if let Some(symbol) = symbol {
                config.data.symbol = symbol;
            }
            if let Some(interval) = interval {
                config.data.interval = interval;
            }
            if let Some(limit) = limit {
                config.data.limit = limit;
            }

            let market = config.validate().context("Invalid configuration")?;
            let candles = load_candles(&config, market).await?;
            DataLoader::save_candles(&candles, &output)
                .with_context(|| format!("Failed to save candles to {:?}", output))?;
            info!("Saved {} candles to {:?}", candles.len(), output);
        }
    }

    Ok(())
}

async fn train(config: &AppConfig) -> Result<()> {
    let market = config.validate().context("Invalid configuration")?;
    let candles = load_candles(config, market).await?;
    let run_info = run_info(config, market);

    let output = run_pipeline(&candles, &run_info, &config.pipeline_settings())
        .context("Training pipeline failed")?;

    if let Some(path) = &config.output.model_out {
        SavedModel::new(&run_info, &output.scaler, &output.model)
            .save(path)
            .with_context(|| format!("Failed to save model to {:?}", path))?;
        info!("Model saved to {:?}", path);
    }

    if config.output.json {
        println!("{}", serde_json::to_string_pretty(&output.report)?);
    } else {
        print!(
            "{}",
            output.report.render_text(config.output.model_out.as_deref())
        );
    }

    Ok(())
}

async fn predict(config: &AppConfig, model_path: &Path) -> Result<()> {
    let market = config.validate().context("Invalid configuration")?;

    let saved = SavedModel::load(model_path)
        .with_context(|| format!("Failed to load model from {:?}", model_path))?;
    if saved.symbol != config.data.symbol || saved.interval != config.data.interval {
        tracing::warn!(
            "Model was trained on {} {}, scoring {} {}",
            saved.symbol,
            saved.interval,
            config.data.symbol,
            config.data.interval
        );
    }
    let (scaler, model) = saved.into_parts().context("Saved model is not usable")?;

    let candles = load_candles(config, market).await?;
    let latest = build_latest_features(&candles).context("Failed to compute latest features")?;
    let normalized = scaler.transform(&latest)?;
    let predicted_return = model.predict(normalized.view())?;

    let signal = signal_from_prediction(
        predicted_return,
        config.backtest.long_threshold,
        config.backtest.short_threshold,
    );

    let output = PredictionOutput {
        symbol: config.data.symbol.clone(),
        interval: config.data.interval.clone(),
        candle_close_time: candles
            .last()
            .map(|c| c.close_time)
            .context("No candles loaded")?,
        predicted_return,
        signal,
    };

    if config.output.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "{} {} @ {}",
            output.symbol, output.interval, output.candle_close_time
        );
        println!("Predicted next return: {:.4}%", predicted_return * 100.0);
        println!("Signal: {}", signal);
    }

    Ok(())
}

async fn load_candles(config: &AppConfig, market: Market) -> Result<Vec<Candle>> {
    match market {
        Market::Coin => {
            let client = BinanceClient::new(config.data.base_url.as_deref(), config.timeout())?;
            client
                .fetch_klines(&config.data.symbol, &config.data.interval, config.data.limit)
                .await
                .with_context(|| {
                    format!(
                        "Failed to fetch {} {} klines",
                        config.data.symbol, config.data.interval
                    )
                })
        }
        Market::Stock => {
            let path = config
                .stock_csv()
                .context("stock_csv is required when market=stock")?;
            DataLoader::load_candles(path, config.data.limit)
                .with_context(|| format!("Failed to load candles from {:?}", path))
        }
    }
}

fn run_info(config: &AppConfig, market: Market) -> RunInfo {
    RunInfo {
        market: market.to_string(),
        data_source: market.data_source().to_string(),
        symbol: config.data.symbol.clone(),
        interval: config.data.interval.clone(),
    }
}
