//! Gemini vision provider
//!
//! Talks to the Gemini `generateContent` REST endpoint with reqwest. The image
//! is sent inline (base64) next to a fixed LaTeX instruction.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;

use super::provider::Transcriber;
use super::types::{
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, RequestContent,
    RequestPart, TranscriptionError, LATEX_PROMPT, VALIDATION_PROMPT,
};
use crate::config::GeminiConfig;

/// Gemini-backed transcriber
pub struct GeminiTranscriber {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    generation: GenerationConfig,
    request_timeout: Duration,
    validation_timeout: Duration,
}

impl GeminiTranscriber {
    pub fn new(config: &GeminiConfig) -> Result<Self, TranscriptionError> {
        match config.masked_key() {
            Some(masked) => tracing::info!(key = %masked, model = %config.model, "Using Gemini API key"),
            None => tracing::warn!("Gemini API key is missing or too short"),
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("pic2word-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TranscriptionError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            generation: GenerationConfig::default(),
            request_timeout: config.request_timeout(),
            validation_timeout: config.validation_timeout(),
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Issue a single `generateContent` call bounded by `timeout`
    async fn generate(
        &self,
        request: &GenerateContentRequest,
        timeout: Duration,
    ) -> Result<GenerateContentResponse, TranscriptionError> {
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                TranscriptionError::Timeout(timeout)
            } else {
                TranscriptionError::Transport(e.to_string())
            }
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(&map_err)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::from_api_response(status.as_u16(), &body));
        }

        let body = response.bytes().await.map_err(&map_err)?;
        serde_json::from_slice(&body).map_err(|e| TranscriptionError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl Transcriber for GeminiTranscriber {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn transcribe(&self, image_data: &[u8], mime_type: &str) -> Result<String, TranscriptionError> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![
                    RequestPart::text(LATEX_PROMPT),
                    RequestPart::InlineData(InlineData {
                        mime_type: mime_type.to_string(),
                        data: base64::engine::general_purpose::STANDARD.encode(image_data),
                    }),
                ],
            }],
            generation_config: Some(self.generation),
        };

        tracing::debug!(
            model = %self.model,
            bytes = image_data.len(),
            mime_type = %mime_type,
            "Calling Gemini"
        );

        let response = self.generate(&request, self.request_timeout).await?;
        if let Some(reason) = response
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
        {
            tracing::debug!(finish_reason = %reason, "Gemini candidate finished");
        }
        let latex = response.first_text()?.to_string();

        tracing::info!(chars = latex.chars().count(), "Gemini transcription complete");
        Ok(latex)
    }

    async fn validate(&self) -> Result<(), TranscriptionError> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart::text(VALIDATION_PROMPT)],
            }],
            generation_config: None,
        };

        let response = self.generate(&request, self.validation_timeout).await?;
        match response.first_text() {
            // A non-text reply still proves the key works
            Ok(_) | Err(TranscriptionError::NoTextPart) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, response::IntoResponse, Json, Router};
    use serde_json::{json, Value};

    async fn spawn_mock(app: Router) -> GeminiConfig {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        GeminiConfig {
            api_key: "test-key-123".to_string(),
            base_url: format!("http://{}/v1beta", addr),
            ..crate::config::Config::default().gemini
        }
    }

    fn reply(status: StatusCode, body: Value) -> Router {
        Router::new().fallback(move || {
            let body = body.clone();
            async move { (status, Json(body)).into_response() }
        })
    }

    #[tokio::test]
    async fn test_transcribe_sends_image_and_returns_text() {
        let app = Router::new().fallback(|headers: HeaderMap, Json(body): Json<Value>| async move {
            assert_eq!(headers["x-goog-api-key"], "test-key-123");
            let parts = &body["contents"][0]["parts"];
            assert_eq!(parts[0]["text"], LATEX_PROMPT);
            assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
            assert_eq!(parts[1]["inlineData"]["data"], "aW1n");
            assert_eq!(body["generationConfig"]["topK"], 40);

            Json(json!({
                "candidates": [{"content": {"parts": [{"text": "\\section{Hi}"}], "role": "model"}}]
            }))
        });
        let config = spawn_mock(app).await;
        let transcriber = GeminiTranscriber::new(&config).unwrap();

        let latex = transcriber.transcribe(b"img", "image/png").await.unwrap();
        assert_eq!(latex, "\\section{Hi}");
    }

    #[tokio::test]
    async fn test_quota_exhausted() {
        let config = spawn_mock(reply(
            StatusCode::TOO_MANY_REQUESTS,
            json!({"error": {"code": 429, "message": "quota", "status": "RESOURCE_EXHAUSTED"}}),
        ))
        .await;
        let transcriber = GeminiTranscriber::new(&config).unwrap();

        let err = transcriber.transcribe(b"img", "image/png").await.unwrap_err();
        assert!(matches!(err, TranscriptionError::QuotaExhausted(_)));
    }

    #[tokio::test]
    async fn test_authentication_rejected() {
        let config = spawn_mock(reply(
            StatusCode::UNAUTHORIZED,
            json!({"error": {"code": 401, "message": "bad key", "status": "UNAUTHENTICATED"}}),
        ))
        .await;
        let transcriber = GeminiTranscriber::new(&config).unwrap();

        let err = transcriber.transcribe(b"img", "image/png").await.unwrap_err();
        assert!(matches!(err, TranscriptionError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_empty_candidates() {
        let config = spawn_mock(reply(StatusCode::OK, json!({"candidates": []}))).await;
        let transcriber = GeminiTranscriber::new(&config).unwrap();

        let err = transcriber.transcribe(b"img", "image/png").await.unwrap_err();
        assert!(matches!(err, TranscriptionError::NoCandidates));
    }

    #[tokio::test]
    async fn test_timeout() {
        let app = Router::new().fallback(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"candidates": []}))
        });
        let config = spawn_mock(app).await;
        let transcriber = GeminiTranscriber::new(&config)
            .unwrap()
            .with_request_timeout(Duration::from_millis(200));

        let err = transcriber.transcribe(b"img", "image/png").await.unwrap_err();
        assert!(matches!(err, TranscriptionError::Timeout(_)));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_validate() {
        let config = spawn_mock(reply(
            StatusCode::OK,
            json!({"candidates": [{"content": {"parts": [{"text": "connected"}]}}]}),
        ))
        .await;
        let transcriber = GeminiTranscriber::new(&config).unwrap();
        transcriber.validate().await.unwrap();

        let config = spawn_mock(reply(StatusCode::OK, json!({"candidates": [{"content": {"parts": []}}]}))).await;
        let transcriber = GeminiTranscriber::new(&config).unwrap();
        assert!(matches!(
            transcriber.validate().await,
            Err(TranscriptionError::EmptyContent)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let config = GeminiConfig {
            base_url: "http://127.0.0.1:1/v1beta".to_string(),
            ..crate::config::Config::default().gemini
        };
        let transcriber = GeminiTranscriber::new(&config).unwrap();

        let err = transcriber.transcribe(b"img", "image/png").await.unwrap_err();
        assert!(matches!(err, TranscriptionError::Transport(_)));
    }
}
