//! Transcription Types
//!
//! Request/response shapes of the Gemini `generateContent` REST call and the
//! error taxonomy reported to the request handler.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// MIME type used when the upload's extension is not recognised
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Instruction sent alongside every image
pub const LATEX_PROMPT: &str = "Convert the content of this image into a complete Overleaf-ready LaTeX document. \
Make sure the generated LaTeX is complete and compiles, including the necessary preamble. \
Return only the LaTeX code, without any explanation.";

/// Prompt used to check that an API key works
pub const VALIDATION_PROMPT: &str = "Testing the API connection, please reply 'connected'";

/// Sampling parameters for transcription calls
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 4096,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<RequestContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
pub struct RequestContent {
    pub role: &'static str,
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestPart {
    Text(String),
    InlineData(InlineData),
}

impl RequestPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64-encoded payload
    pub data: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<ResponseContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

/// One part of a candidate. Only text parts are of interest; everything else
/// (inline data, function calls) deserializes with `text: None`.
#[derive(Debug, Default, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// First text segment of the first candidate
    pub fn first_text(&self) -> Result<&str, TranscriptionError> {
        let candidate = self
            .candidates
            .first()
            .ok_or(TranscriptionError::NoCandidates)?;

        let parts = candidate
            .content
            .as_ref()
            .map(|c| c.parts.as_slice())
            .unwrap_or_default();
        if parts.is_empty() {
            return Err(TranscriptionError::EmptyContent);
        }

        parts
            .iter()
            .find_map(|p| p.text.as_deref())
            .ok_or(TranscriptionError::NoTextPart)
    }
}

/// Error envelope returned by Google APIs
#[derive(Debug, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

/// Transcription error types
#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("AI transcription timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("AI authentication failed, check the API key: {0}")]
    Authentication(String),

    #[error("AI quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("AI returned no candidates")]
    NoCandidates,

    #[error("AI returned empty content")]
    EmptyContent,

    #[error("AI response contained no text")]
    NoTextPart,

    #[error("AI API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("AI request failed: {0}")]
    Transport(String),

    #[error("Invalid AI response: {0}")]
    InvalidResponse(String),
}

impl TranscriptionError {
    /// Machine readable code used in HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "transcription_timeout",
            Self::Authentication(_) => "transcription_auth",
            Self::QuotaExhausted(_) => "transcription_quota",
            Self::NoCandidates => "transcription_no_candidates",
            Self::EmptyContent => "transcription_empty",
            Self::NoTextPart => "transcription_no_text",
            Self::Api { .. } => "transcription_api",
            Self::Transport(_) => "transcription_transport",
            Self::InvalidResponse(_) => "transcription_invalid_response",
        }
    }

    /// Classify a non-success HTTP response.
    ///
    /// The status code and the `status` field of the Google error body are
    /// authoritative. Matching on the message text is only a fallback for
    /// invalid keys, which Google reports as a plain 400.
    pub fn from_api_response(http_status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok();
        let (status, message) = match parsed {
            Some(envelope) => (envelope.error.status, envelope.error.message),
            None => (String::new(), body.trim().to_string()),
        };

        match (http_status, status.as_str()) {
            (401, _) | (403, _) | (_, "UNAUTHENTICATED") | (_, "PERMISSION_DENIED") => {
                Self::Authentication(message)
            }
            (429, _) | (_, "RESOURCE_EXHAUSTED") => Self::QuotaExhausted(message),
            (400, _) if message.contains("API key not valid") || message.contains("API_KEY_INVALID") => {
                Self::Authentication(message)
            }
            _ => Self::Api {
                status: http_status,
                message,
            },
        }
    }
}

/// Guess an image MIME type from a file name
pub fn mime_for_path(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first()
        .filter(|m| m.type_() == mime_guess::mime::IMAGE)
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_first_text_of_first_candidate() {
        let response = parse(
            r#"{"candidates":[
                {"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":""}},{"text":"\\documentclass{article}"},{"text":"second"}],"role":"model"},"finishReason":"STOP"},
                {"content":{"parts":[{"text":"other candidate"}]}}
            ]}"#,
        );
        assert_eq!(response.first_text().unwrap(), "\\documentclass{article}");
        assert_eq!(response.candidates[0].finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_no_candidates() {
        let response = parse(r#"{"candidates":[]}"#);
        assert!(matches!(response.first_text(), Err(TranscriptionError::NoCandidates)));

        let response = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
        assert!(matches!(response.first_text(), Err(TranscriptionError::NoCandidates)));
    }

    #[test]
    fn test_empty_parts() {
        let response = parse(r#"{"candidates":[{"content":{"parts":[]}}]}"#);
        assert!(matches!(response.first_text(), Err(TranscriptionError::EmptyContent)));

        let response = parse(r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#);
        assert!(matches!(response.first_text(), Err(TranscriptionError::EmptyContent)));
    }

    #[test]
    fn test_no_text_part() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"AA=="}}]}}]}"#,
        );
        assert!(matches!(response.first_text(), Err(TranscriptionError::NoTextPart)));
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![
                    RequestPart::text("prompt"),
                    RequestPart::InlineData(InlineData {
                        mime_type: "image/png".to_string(),
                        data: "AAAA".to_string(),
                    }),
                ],
            }],
            generation_config: Some(GenerationConfig::default()),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "prompt");
        assert_eq!(value["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(value["generationConfig"]["topK"], 40);
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 4096);
    }

    #[test]
    fn test_error_classification() {
        let quota = r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        assert!(matches!(
            TranscriptionError::from_api_response(429, quota),
            TranscriptionError::QuotaExhausted(_)
        ));

        let denied = r#"{"error":{"code":403,"message":"Permission denied","status":"PERMISSION_DENIED"}}"#;
        assert!(matches!(
            TranscriptionError::from_api_response(403, denied),
            TranscriptionError::Authentication(_)
        ));

        let bad_key = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        assert!(matches!(
            TranscriptionError::from_api_response(400, bad_key),
            TranscriptionError::Authentication(_)
        ));

        let other = TranscriptionError::from_api_response(500, "upstream exploded");
        match other {
            TranscriptionError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            e => panic!("unexpected error: {e:?}"),
        }
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path("scan.png"), "image/png");
        assert_eq!(mime_for_path("scan.JPG"), "image/jpeg");
        assert_eq!(mime_for_path("scan.webp"), "image/webp");
        assert_eq!(mime_for_path("scan"), DEFAULT_IMAGE_MIME);
        assert_eq!(mime_for_path("notes.txt"), DEFAULT_IMAGE_MIME);
    }

    #[test]
    fn test_timeout_message_is_distinct() {
        let err = TranscriptionError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "AI transcription timed out after 30s");
        assert_eq!(err.code(), "transcription_timeout");
    }
}
