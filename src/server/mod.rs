//! HTTP inference service
//!
//! Routes:
//! - `POST /predict`: multipart upload with a `file` field, answers
//!   `{"prediction": ..., "advice": ...}`
//! - `GET /health`: liveness and model summary
//!
//! Every origin may call the service, so a browser front end served from
//! another port can post images directly.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::backend::backend_name;
use crate::utils::error::{PlantDiseaseError, Result};

pub use config::ServerConfig;
pub use error::ApiError;
pub use state::{PredictionResponse, ServiceContext, SharedState};

/// Build the router around an already loaded context
pub fn build_router(context: ServiceContext, config: &ServerConfig) -> Router {
    let state: SharedState = Arc::new(context);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/predict", post(routes::predict::predict))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Load the context, bind and serve until the process is stopped
pub async fn run_server(config: ServerConfig) -> Result<()> {
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| PlantDiseaseError::Config(format!("invalid bind address: {}", e)))?;

    info!("Backend: {}", backend_name());
    info!("Model:         {:?}", config.model_path);
    info!("Class indices: {:?}", config.class_indices_path);

    let context = ServiceContext::load(&config)?;
    info!("Serving {} classes", context.num_classes());

    let app = build_router(context, &config);

    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::state::tests::{context, leaf_png};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "leafboundary";

    fn multipart_body(field: &str, filename: Option<&str>, content: &[u8]) -> Vec<u8> {
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", field);
        if let Some(filename) = filename {
            disposition.push_str(&format!("; filename=\"{}\"", filename));
        }

        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(format!("{}\r\n", disposition).as_bytes());
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn multipart_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn predict_request(field: &str, content: &[u8]) -> Request<Body> {
        multipart_request(multipart_body(field, Some("leaf.png"), content))
    }

    async fn send_with_config(
        config: &ServerConfig,
        scores: Vec<f32>,
        request: Request<Body>,
    ) -> (StatusCode, Value) {
        let app = build_router(context(scores), config);
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn send(scores: Vec<f32>, request: Request<Body>) -> (StatusCode, Value) {
        send_with_config(&ServerConfig::default(), scores, request).await
    }

    #[tokio::test]
    async fn test_predict_known_label() {
        let (status, body) = send(vec![0.3, 0.7], predict_request("file", &leaf_png())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prediction"], "Leaf Rust");
        assert_eq!(body["advice"], "Remove infected leaves and apply a fungicide.");
    }

    #[tokio::test]
    async fn test_predict_falls_back_for_unknown_label() {
        let (status, body) = send(vec![0.6, 0.4], predict_request("file", &leaf_png())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({
                "prediction": "healthy",
                "advice": "No advice available for this disease."
            })
        );
    }

    #[tokio::test]
    async fn test_missing_file_field() {
        let (status, body) = send(vec![0.5, 0.5], predict_request("image", &leaf_png())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"error": "No file uploaded"}));
    }

    #[tokio::test]
    async fn test_text_field_named_file_is_not_an_upload() {
        let request = multipart_request(multipart_body("file", None, b"leaf.png"));
        let (status, body) = send(vec![0.5, 0.5], request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"error": "No file uploaded"}));
    }

    #[tokio::test]
    async fn test_truncated_multipart_body() {
        let mut body = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"leaf.png\"\r\n\r\n",
            BOUNDARY
        )
        .into_bytes();
        body.extend_from_slice(&leaf_png()[..16]);

        let (status, body) = send(vec![0.5, 0.5], multipart_request(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_upload_over_body_limit() {
        let config = ServerConfig::default().with_body_limit_mb(1);
        let oversized = vec![0u8; 2 * 1024 * 1024];

        let (status, body) =
            send_with_config(&config, vec![0.5, 0.5], predict_request("file", &oversized)).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_request_without_multipart_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/predict")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(vec![0.5, 0.5], request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"error": "No file uploaded"}));
    }

    #[tokio::test]
    async fn test_non_image_upload() {
        let (status, body) = send(vec![0.5, 0.5], predict_request("file", b"plain text")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid image"));
    }

    #[tokio::test]
    async fn test_unlabeled_index_is_server_error() {
        let (status, body) = send(vec![0.1, 0.1, 0.8], predict_request("file", &leaf_png())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(vec![0.5, 0.5], request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["num_classes"], 2);
        assert_eq!(body["version"], crate::VERSION);
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let app = build_router(context(vec![0.5, 0.5]), &ServerConfig::default());
        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
