//! Server configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::inference::{DEFAULT_CLASS_INDICES_PATH, DEFAULT_MODEL_PATH};
use crate::SERVE_IMAGE_SIZE;

/// Bytes in one mebibyte
const MIB: usize = 1024 * 1024;

/// Inference service configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Weights of the served classifier
    pub model_path: PathBuf,
    /// JSON object mapping class name to output index
    pub class_indices_path: PathBuf,
    /// Optional JSON replacement for the built-in disease table
    pub disease_info_path: Option<PathBuf>,
    /// Side length uploads are resized to
    pub image_size: usize,
    /// Maximum request body size in bytes
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            class_indices_path: PathBuf::from(DEFAULT_CLASS_INDICES_PATH),
            disease_info_path: None,
            image_size: SERVE_IMAGE_SIZE,
            body_limit_bytes: 10 * MIB,
        }
    }
}

impl ServerConfig {
    /// Set the body limit in mebibytes
    pub fn with_body_limit_mb(mut self, mb: usize) -> Self {
        self.body_limit_bytes = mb * MIB;
        self
    }

    /// `host:port` string to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("host must not be empty".to_string());
        }

        // Four 2x2 pooling stages
        if self.image_size < 16 {
            return Err("image_size must be at least 16".to_string());
        }

        if self.body_limit_bytes == 0 {
            return Err("body limit must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "127.0.0.1:5000");
        assert_eq!(config.model_path, PathBuf::from("plant_disease_model.mpk"));
        assert_eq!(config.class_indices_path, PathBuf::from("class_indices.json"));
        assert_eq!(config.image_size, 160);
        assert_eq!(config.body_limit_bytes, 10 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_config_validation() {
        let mut config = ServerConfig::default();
        config.image_size = 8;
        assert!(config.validate().is_err());

        let config = ServerConfig::default().with_body_limit_mb(0);
        assert!(config.validate().is_err());
    }
}
