use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to initialize OCR engine: {0}")]
    Initialization(String),

    #[error("Could not decode image: {0}")]
    InvalidImage(String),

    #[error("Preprocessing failed: {0}")]
    Preprocessing(String),

    #[error("Text recognition failed: {0}")]
    Recognition(String),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Missing image in request")]
    MissingImage,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure calling an outbound provider (search or language model).
///
/// Never escapes a pipeline component: each component folds it into a
/// user-visible string. Timeout is its own kind so callers can tell a slow
/// provider from a broken one in logs.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request timed out")]
    Timeout,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("unexpected response payload: {0}")]
    Payload(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Payload(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ScanError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ScanError::Initialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INIT_ERROR"),
            ScanError::InvalidImage(_) => (StatusCode::BAD_REQUEST, "INVALID_IMAGE"),
            ScanError::Preprocessing(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PREPROCESSING_ERROR")
            }
            ScanError::Recognition(_) => (StatusCode::INTERNAL_SERVER_ERROR, "RECOGNITION_ERROR"),
            ScanError::ImageTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "IMAGE_TOO_LARGE"),
            ScanError::MissingImage => (StatusCode::BAD_REQUEST, "MISSING_IMAGE"),
            ScanError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ScanError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}
