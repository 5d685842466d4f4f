//! Data module: candle types, feature engineering, splitting, scaling and loading

pub mod features;
pub mod loader;
pub mod scaler;
pub mod split;
pub mod types;

pub use features::{build_dataset, build_latest_features, feature_at, feature_names, FeatureError};
pub use loader::{DataLoader, LoadError};
pub use scaler::{ScalerError, StandardScaler};
pub use split::{split_sequential, SplitError};
pub use types::{samples_to_xy, Candle, Sample};
