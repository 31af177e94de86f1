//! Dataset module for the training pipeline
//!
//! This module provides functionality for:
//! - Discovering a class-per-subdirectory image tree
//! - Splitting it into training and validation subsets
//! - Loading images into Burn datasets and batches
//!
//! ## Split Strategy
//!
//! Classes are indexed by sorted directory name. Within each class, files are
//! sorted by name and the leading 20% (rounded down) form the validation
//! subset. The split is deterministic; training order is shuffled per epoch by
//! the fit loop instead.

pub mod burn_dataset;
pub mod loader;

// Re-export main types for convenience
pub use burn_dataset::{LeafBatch, LeafBatcher, LeafImageDataset, LeafImageItem};
pub use loader::{is_image_file, FolderSplit, ImageFolder, ImageSample};

/// Default training data directory
pub const DEFAULT_DATA_DIR: &str = "uploads";

/// Default fraction of each class held out for validation
pub const DEFAULT_VALIDATION_SPLIT: f64 = 0.2;
