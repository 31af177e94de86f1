//! Model Configuration Module
//!
//! Hyperparameters and paths for the binary training command.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::cnn::BinaryLeafClassifierConfig;
use crate::dataset::{DEFAULT_DATA_DIR, DEFAULT_VALIDATION_SPLIT};
use crate::training::{
    DEFAULT_BATCH_SIZE, DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE, DEFAULT_OUTPUT_PATH,
};
use crate::TRAIN_IMAGE_SIZE;

/// Smallest input that survives two (conv 3x3, pool 2x2) stages
pub const MIN_IMAGE_SIZE: usize = 10;

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Directory with one subdirectory per class
    pub data_dir: String,

    /// Where the trained weights are written
    pub output_path: String,

    /// Input image size (width and height, assumed square)
    pub image_size: usize,

    /// Batch size for training
    pub batch_size: usize,

    /// Fraction of each class held out for validation
    pub validation_split: f64,

    /// Number of training epochs
    pub epochs: usize,

    /// Adam learning rate
    pub learning_rate: f64,

    /// Dropout rate before the output unit
    pub dropout_rate: f64,

    /// Seed for per-epoch shuffling
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_dir: DEFAULT_DATA_DIR.to_string(),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            image_size: TRAIN_IMAGE_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            validation_split: DEFAULT_VALIDATION_SPLIT,
            epochs: DEFAULT_EPOCHS,
            learning_rate: DEFAULT_LEARNING_RATE,
            dropout_rate: 0.5,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    /// Create a fast training config for smoke tests
    pub fn debug() -> Self {
        Self {
            image_size: 32,
            batch_size: 4,
            epochs: 1,
            ..Default::default()
        }
    }

    /// Architecture of the network this config trains
    pub fn model_config(&self) -> BinaryLeafClassifierConfig {
        BinaryLeafClassifierConfig::new()
            .with_input_size(self.image_size)
            .with_dropout_rate(self.dropout_rate)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.image_size < MIN_IMAGE_SIZE {
            return Err(format!("image_size must be at least {}", MIN_IMAGE_SIZE));
        }

        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }

        if self.epochs == 0 {
            return Err("epochs must be greater than 0".to_string());
        }

        if !(0.0..1.0).contains(&self.validation_split) {
            return Err("validation_split must be in range [0.0, 1.0)".to_string());
        }

        if self.learning_rate <= 0.0 {
            return Err("learning_rate must be positive".to_string());
        }

        if !(0.0..1.0).contains(&self.dropout_rate) {
            return Err("dropout_rate must be in range [0.0, 1.0)".to_string());
        }

        if self.output_path.trim().is_empty() {
            return Err("output_path must not be empty".to_string());
        }

        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }

    /// Load configuration from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}
