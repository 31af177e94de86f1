//! Inference module
//!
//! This module provides:
//! - Image preprocessing for uploaded bytes
//! - The class-index mapping and disease advice table
//! - The `Classifier` seam and its Burn implementation

pub mod disease_info;
pub mod labels;
pub mod predictor;
pub mod preprocess;

// Re-export main types for convenience
pub use disease_info::{DiseaseInfo, DiseaseInfoTable, NO_ADVICE};
pub use labels::ClassIndex;
pub use predictor::{argmax, BurnClassifier, Classifier};
pub use preprocess::{prepare_image, PreparedImage};

/// Default path of the served model weights
pub const DEFAULT_MODEL_PATH: &str = "plant_disease_model.mpk";

/// Default path of the class-index file
pub const DEFAULT_CLASS_INDICES_PATH: &str = "class_indices.json";
