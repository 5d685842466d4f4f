//! JSON persistence for a fitted scaler and trained model.

use crate::data::features::FEATURE_NAMES;
use crate::data::scaler::{ScalerError, StandardScaler};
use crate::models::linear::LinearModel;
use crate::pipeline::RunInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

/// Errors while saving or restoring a model
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Feature names {found:?} do not match {expected:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Model has {weights} weights for {features} features")]
    WeightCountMismatch { weights: usize, features: usize },

    #[error("Invalid scaler state: {0}")]
    Scaler(#[from] ScalerError),
}

/// Stored scaler statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

/// Stored model parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    pub weights: Vec<f64>,
    pub bias: f64,
}

/// Everything needed to reproduce predictions for a trained run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedModel {
    pub market: String,
    pub data_source: String,
    pub symbol: String,
    pub interval: String,
    pub feature_names: Vec<String>,
    pub scaler: ScalerState,
    pub model: ModelState,
    pub trained_at: DateTime<Utc>,
}

impl SavedModel {
    /// Snapshot the fitted scaler and model, stamped with the current time
    pub fn new(info: &RunInfo, scaler: &StandardScaler, model: &LinearModel) -> Self {
        Self {
            market: info.market.clone(),
            data_source: info.data_source.clone(),
            symbol: info.symbol.clone(),
            interval: info.interval.clone(),
            feature_names: crate::data::features::feature_names(),
            scaler: ScalerState {
                means: scaler.means().to_vec(),
                stds: scaler.stds().to_vec(),
            },
            model: ModelState {
                weights: model.weights().to_vec(),
                bias: model.bias(),
            },
            trained_at: Utc::now(),
        }
    }

    /// Write as pretty JSON, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Rebuild the scaler and model.
    ///
    /// Fails if the stored feature list differs from the one this build
    /// computes, since weights are bound to features by position.
    pub fn into_parts(self) -> Result<(StandardScaler, LinearModel), PersistenceError> {
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied()) {
            return Err(PersistenceError::FeatureMismatch {
                expected: crate::data::features::feature_names(),
                found: self.feature_names,
            });
        }
        if self.model.weights.len() != FEATURE_NAMES.len() {
            return Err(PersistenceError::WeightCountMismatch {
                weights: self.model.weights.len(),
                features: FEATURE_NAMES.len(),
            });
        }

        let scaler = StandardScaler::from_parts(self.scaler.means, self.scaler.stds)?;
        if scaler.feature_count() != FEATURE_NAMES.len() {
            return Err(PersistenceError::Scaler(ScalerError::DimensionMismatch {
                expected: FEATURE_NAMES.len(),
                got: scaler.feature_count(),
            }));
        }
        let model = LinearModel::from_parts(self.model.weights, self.model.bias);
        Ok((scaler, model))
    }
}
