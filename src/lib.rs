//! # Plant Disease Classification
//!
//! A Rust library for classifying plant-leaf images into disease categories
//! with the Burn framework.
//!
//! ## Features
//!
//! - **HTTP inference service** exposing a single `POST /predict` endpoint
//! - **Disease advice lookup** mapping predicted labels to user-facing text
//! - **Training command** for a small binary CNN over a class-per-folder image tree
//!
//! ## Modules
//!
//! - `dataset`: Image folder discovery, validation split and Burn batching
//! - `model`: CNN architectures and configuration
//! - `training`: The supervised fit loop for the binary leaf classifier
//! - `inference`: Preprocessing, class-index mapping, disease table and classifiers
//! - `server`: Axum router, service context and request handlers
//! - `utils`: Logging and error types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use plant_disease::server::{build_router, ServerConfig, ServiceContext};
//!
//! let config = ServerConfig::default();
//! let context = ServiceContext::load(&config)?;
//! let app = build_router(context, &config);
//! ```

pub mod backend;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod server;
pub mod training;
pub mod utils;

// Re-export commonly used items for convenience
pub use dataset::{ImageFolder, ImageSample, LeafBatch, LeafBatcher, LeafImageDataset, LeafImageItem};
pub use inference::{
    prepare_image, BurnClassifier, ClassIndex, Classifier, DiseaseInfo, DiseaseInfoTable,
    PreparedImage,
};
pub use model::{BinaryLeafClassifier, PlantClassifier, TrainingConfig};
pub use server::{build_router, PredictionResponse, ServerConfig, ServiceContext};
pub use training::{run_training, EpochMetrics, TrainingReport};
pub use utils::error::{PlantDiseaseError, Result};

/// Input resolution of the served multi-class classifier
pub const SERVE_IMAGE_SIZE: usize = 160;

/// Input resolution of the binary training pipeline
pub const TRAIN_IMAGE_SIZE: usize = 150;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
