//! Error Handling Module
//!
//! Defines the error type shared by the inference service and the training
//! command. Binaries wrap it in `anyhow` at the top level.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for plant disease operations
#[derive(Error, Debug)]
pub enum PlantDiseaseError {
    /// An image on disk could not be opened or decoded
    #[error("Failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    /// Uploaded bytes are not a decodable image
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Error with dataset discovery or splitting
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Error building, loading or saving a model
    #[error("Model error: {0}")]
    Model(String),

    /// Error inside the fit loop
    #[error("Training error: {0}")]
    Training(String),

    /// Error while running a prediction
    #[error("Inference error: {0}")]
    Inference(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Convenience Result type for plant disease operations
pub type Result<T> = std::result::Result<T, PlantDiseaseError>;

/// Require a file or directory to exist before it is read
pub fn ensure_exists(path: &std::path::Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(PlantDiseaseError::PathNotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlantDiseaseError::Dataset("no classes".to_string());
        assert_eq!(format!("{}", err), "Dataset error: no classes");
    }

    #[test]
    fn test_invalid_image_message() {
        let err = PlantDiseaseError::InvalidImage("unsupported format".to_string());
        assert_eq!(err.to_string(), "Invalid image: unsupported format");
    }

    #[test]
    fn test_image_load_error() {
        let path = PathBuf::from("/uploads/rust/leaf.jpg");
        let err = PlantDiseaseError::ImageLoad(path, "truncated".to_string());
        assert!(format!("{}", err).contains("leaf.jpg"));
    }

    #[test]
    fn test_json_error_converts() {
        let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: PlantDiseaseError = parsed.unwrap_err().into();
        assert!(matches!(err, PlantDiseaseError::Serialization(_)));
    }

    #[test]
    fn test_ensure_exists() {
        let missing = PathBuf::from("/definitely/not/here/model.mpk");
        assert!(matches!(
            ensure_exists(&missing),
            Err(PlantDiseaseError::PathNotFound(_))
        ));
    }
}
