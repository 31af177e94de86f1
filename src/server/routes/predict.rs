//! Prediction endpoint

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};

use crate::server::error::ApiError;
use crate::server::state::{PredictionResponse, SharedState};

/// Multipart field carrying the image
pub const FILE_FIELD: &str = "file";

/// POST /predict - Classify the image in the `file` field
pub async fn predict(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let mut multipart = multipart?;

    // Only a file part counts as an upload; a plain text field named
    // `file` is treated as missing
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) && field.file_name().is_some() {
            upload = Some(field.bytes().await?);
            break;
        }
    }
    let bytes = upload.ok_or_else(ApiError::no_file_uploaded)?;

    // Decoding and the forward pass are CPU-bound
    let response = tokio::task::spawn_blocking(move || state.predict(&bytes))
        .await
        .map_err(|e| ApiError::internal(format!("prediction task failed: {}", e)))??;

    Ok(Json(response))
}
