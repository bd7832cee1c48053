//! Error types for the pic2word server

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::convert::ConversionError;
use crate::transcribe::TranscriptionError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unable to get the uploaded image: no 'image' field in the form")]
    MissingImage,

    #[error("Only docx format is currently supported (got '{0}')")]
    UnsupportedFormat(String),

    #[error("Failed to save the uploaded image: {0}")]
    SaveUpload(#[source] std::io::Error),

    #[error("Image recognition failed: {0}")]
    Transcription(#[from] TranscriptionError),

    #[error("Failed to convert to Word document: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Failed to read the generated Word document: {0}")]
    ReadDocument(#[source] std::io::Error),

    #[error("Request deadline of {}s exceeded", .0.as_secs_f32())]
    DeadlineExceeded(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::MissingImage | AppError::UnsupportedFormat(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Conversion(ConversionError::UnsupportedFormat(_)) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::PayloadTooLarge(_) => "payload_too_large",
            AppError::MissingImage => "missing_image",
            AppError::UnsupportedFormat(_) => "unsupported_format",
            AppError::SaveUpload(_) => "save_failed",
            AppError::Transcription(e) => e.code(),
            AppError::Conversion(e) => e.code(),
            AppError::ReadDocument(_) => "read_failed",
            AppError::DeadlineExceeded(_) => "deadline_exceeded",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(code = self.code(), "{}", message);
        } else {
            tracing::warn!(code = self.code(), "{}", message);
        }

        let body = Json(ErrorResponse {
            error: message,
            code: self.code(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_400() {
        assert_eq!(AppError::MissingImage.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::UnsupportedFormat("pdf".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Conversion(ConversionError::UnsupportedFormat("pdf".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_upstream_errors_are_500_with_root_cause() {
        let err = AppError::from(TranscriptionError::QuotaExhausted("daily limit".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "transcription_quota");
        assert!(err.to_string().contains("daily limit"));

        let err = AppError::from(ConversionError::NonZeroExit {
            program: "pandoc".into(),
            status: "exit status: 64".into(),
            output: "Error at line 3".into(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("Error at line 3"));
    }

    #[tokio::test]
    async fn test_response_body_shape() {
        let response = AppError::MissingImage.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "missing_image");
        assert!(json["error"].as_str().unwrap().contains("image"));
    }
}
