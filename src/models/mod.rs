//! Return prediction model and its persisted form

pub mod linear;
pub mod persistence;

pub use linear::{LinearModel, ModelError, TrainConfig, TrainStats};
pub use persistence::{PersistenceError, SavedModel};
