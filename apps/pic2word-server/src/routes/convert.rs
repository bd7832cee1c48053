//! Conversion endpoints
//!
//! Endpoints:
//! - POST /api/convert - Upload an image, receive a Word document
//! - GET /api/formats - Supported output formats
//! - GET /api/languages - Supported recognition languages
//!
//! A conversion runs strictly in order: parse the form, validate the format,
//! persist the upload, transcribe it to LaTeX, convert the LaTeX, read the
//! document and stream it back. Every temp file is owned by a guard, so it is
//! removed whichever step fails.

use axum::{
    body::{Body, Bytes},
    extract::{multipart::MultipartError, multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::time::{timeout_at, Instant};

use crate::convert::OutputFormat;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::transcribe::{mime_for_path, TranscriptionError};

/// Form defaults
const DEFAULT_FORMAT: &str = "docx";
const DEFAULT_LANGUAGE: &str = "zh";

/// Recognition language advertised to clients
#[derive(Debug, Clone, Serialize)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

pub const SUPPORTED_LANGUAGES: &[Language] = &[
    Language {
        code: "zh",
        name: "中文",
    },
    Language {
        code: "en",
        name: "英文",
    },
];

/// Create the conversion router
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/convert", post(convert_image))
        .route("/formats", get(supported_formats))
        .route("/languages", get(supported_languages))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// A parsed conversion upload
#[derive(Debug)]
pub struct ConversionRequest {
    pub file_name: String,
    pub image: Bytes,
    pub format: String,
    /// Informational only
    pub language: String,
}

impl ConversionRequest {
    /// Read every form field. Unknown fields are skipped.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut image: Option<(String, Bytes)> = None;
        let mut format: Option<String> = None;
        let mut language: Option<String> = None;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or("").to_string();

            match name.as_str() {
                "image" => {
                    let file_name = field
                        .file_name()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "upload".to_string());
                    let data = field.bytes().await.map_err(multipart_error)?;
                    image = Some((file_name, data));
                }
                "format" => format = Some(field.text().await.map_err(multipart_error)?),
                "language" => language = Some(field.text().await.map_err(multipart_error)?),
                other => tracing::debug!(field = %other, "Ignoring unknown form field"),
            }
        }

        let (file_name, image) = image.ok_or(AppError::MissingImage)?;
        if image.is_empty() {
            return Err(AppError::BadRequest("uploaded image is empty".to_string()));
        }

        Ok(Self {
            file_name,
            image,
            format: non_empty_or(format, DEFAULT_FORMAT),
            language: non_empty_or(language, DEFAULT_LANGUAGE),
        })
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// POST /api/convert
async fn convert_image(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let request = ConversionRequest::from_multipart(multipart).await?;

    let format: OutputFormat = request
        .format
        .parse()
        .map_err(|_| AppError::UnsupportedFormat(request.format.clone()))?;

    tracing::info!(
        file_name = %request.file_name,
        bytes = request.image.len(),
        format = %format,
        language = %request.language,
        transcriber = state.transcriber().name(),
        converter = state.converter().name(),
        "Received conversion request"
    );

    let request_timeout = state.config().request_timeout();
    let deadline = Instant::now() + request_timeout;
    let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();

    let temp = state.temp();
    let image = temp
        .write(temp.upload_path(&timestamp, &request.file_name), &request.image)
        .await
        .map_err(AppError::SaveUpload)?;

    let mime_type = mime_for_path(&request.file_name);
    let latex = match timeout_at(deadline, state.transcriber().transcribe(&request.image, &mime_type)).await {
        Ok(result) => result?,
        Err(_) => return Err(TranscriptionError::Timeout(request_timeout).into()),
    };

    let document = match timeout_at(deadline, state.converter().latex_to_docx(&latex)).await {
        Ok(result) => result?,
        Err(_) => return Err(AppError::DeadlineExceeded(request_timeout)),
    };

    let data = document.read().await;

    // Both files go before the response leaves the handler
    if let Err(e) = document.remove().await {
        tracing::warn!(error = %e, "Failed to remove generated document");
    }
    if let Err(e) = image.remove().await {
        tracing::warn!(error = %e, "Failed to remove uploaded image");
    }

    let data = data.map_err(AppError::ReadDocument)?;
    let filename = format!("pic2word_{}.{}", timestamp, format.extension());

    tracing::info!(
        filename = %filename,
        bytes = data.len(),
        converter = state.converter().name(),
        "Conversion complete"
    );

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Description", "File Transfer")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .header(header::CONTENT_TYPE, format.content_type())
        .header("Content-Transfer-Encoding", "binary")
        .header(header::EXPIRES, "0")
        .header(header::CACHE_CONTROL, "must-revalidate")
        .header(header::PRAGMA, "public")
        .header(header::CONTENT_LENGTH, data.len())
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// GET /api/formats
async fn supported_formats() -> Json<Vec<&'static str>> {
    Json(OutputFormat::ALL.iter().map(|f| f.as_str()).collect())
}

/// GET /api/languages
async fn supported_languages() -> Json<&'static [Language]> {
    Json(SUPPORTED_LANGUAGES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_or() {
        assert_eq!(non_empty_or(None, "docx"), "docx");
        assert_eq!(non_empty_or(Some("  ".into()), "docx"), "docx");
        assert_eq!(non_empty_or(Some(" pdf ".into()), "docx"), "pdf");
    }

    #[test]
    fn test_languages_serialize_as_code_name_pairs() {
        let json = serde_json::to_value(SUPPORTED_LANGUAGES).unwrap();
        assert_eq!(json[0]["code"], "zh");
        assert_eq!(json[1]["code"], "en");
        assert!(json[0]["name"].is_string());
    }
}
