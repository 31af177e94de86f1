//! Mapping from library errors to HTTP responses

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::utils::error::PlantDiseaseError;

/// Message for requests without a `file` field
pub const NO_FILE_UPLOADED: &str = "No file uploaded";

/// Body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// An error that ends a request
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn no_file_uploaded() -> Self {
        Self::new(StatusCode::BAD_REQUEST, NO_FILE_UPLOADED)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<PlantDiseaseError> for ApiError {
    fn from(err: PlantDiseaseError) -> Self {
        match err {
            PlantDiseaseError::InvalidImage(_) => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            other => {
                error!("Prediction failed: {}", other);
                Self::internal(other.to_string())
            }
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), err.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    // A body that is not multipart carries no file field either
    fn from(_: MultipartRejection) -> Self {
        Self::no_file_uploaded()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}
