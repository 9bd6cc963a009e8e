use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures while turning an uploaded document into `ResumeFacts`.
#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("Unsupported file format '{0}'. Use .pdf or .docx only.")]
    UnsupportedFormat(String),

    #[error("{format} reading error: {message}")]
    Extraction {
        format: &'static str,
        message: String,
    },
}

/// Failures while coercing a single prediction request.
/// Never surfaced to callers: the classifier downgrades these to "Unknown".
#[derive(Debug, Error, PartialEq)]
pub enum PredictionError {
    #[error("expected {expected} feature values, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("feature '{feature}' is not numeric: {value:?}")]
    NonNumeric { feature: &'static str, value: String },
}

/// Failures while loading the dataset or fitting the model. Fatal at startup.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("failed to open dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset has no usable rows after dropping invalid ones")]
    NoUsableRows,

    #[error("dataset needs at least two distinct labels, found {0}")]
    SingleClass(usize),
}

/// HTTP-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ResumeError> for AppError {
    fn from(err: ResumeError) -> Self {
        match err {
            ResumeError::UnsupportedFormat(_) => AppError::UnsupportedFormat(err.to_string()),
            ResumeError::Extraction { .. } => AppError::Extraction(err.to_string()),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::Validation(format!("Malformed multipart body: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnsupportedFormat(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_FORMAT",
                msg.clone(),
            ),
            AppError::Extraction(msg) => {
                tracing::error!("Resume extraction error: {msg}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "EXTRACTION_ERROR",
                    msg.clone(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
