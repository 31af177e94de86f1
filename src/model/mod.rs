//! Model module for CNN architectures using the Burn framework
//!
//! This module provides:
//! - The multi-class classifier loaded by the inference service
//! - The binary classifier built by the training command
//! - Training hyperparameters
//!
//! Weights are stored with Burn's `CompactRecorder`, which writes
//! MessagePack files with the `.mpk` extension.

pub mod cnn;
pub mod config;

// Re-export main types for convenience
pub use cnn::{BinaryLeafClassifier, BinaryLeafClassifierConfig, PlantClassifier, PlantClassifierConfig};
pub use config::TrainingConfig;

/// File extension written by `CompactRecorder`
pub const MODEL_EXTENSION: &str = "mpk";
