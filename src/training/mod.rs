//! Training module for the binary leaf classifier
//!
//! One fit cycle with fixed hyperparameters:
//! 1. Scan the class-per-folder image tree and hold out the validation subset
//! 2. Train with Adam and binary cross-entropy, shuffling every epoch
//! 3. Report loss and accuracy per epoch
//! 4. Save the weights

pub mod supervised;

// Re-export main types for convenience
pub use supervised::{run_training, EpochMetrics, TrainingReport};

// Re-export TrainingConfig from model::config where it's defined
pub use crate::model::config::TrainingConfig;

/// Default path of the trained weights
pub const DEFAULT_OUTPUT_PATH: &str = "plant_model.mpk";

/// Default number of training epochs
pub const DEFAULT_EPOCHS: usize = 10;

/// Default batch size
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Default learning rate
pub const DEFAULT_LEARNING_RATE: f64 = 0.001;
