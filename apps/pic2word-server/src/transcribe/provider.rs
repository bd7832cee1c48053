//! Transcription provider trait

use async_trait::async_trait;

use super::types::TranscriptionError;

/// A service that turns an image into LaTeX source
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    /// Transcribe an image. Exactly one upstream attempt is made.
    async fn transcribe(&self, image_data: &[u8], mime_type: &str) -> Result<String, TranscriptionError>;

    /// Check that the provider accepts our credentials
    async fn validate(&self) -> Result<(), TranscriptionError>;
}
