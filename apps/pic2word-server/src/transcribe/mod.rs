//! Transcription Module
//!
//! Turns an uploaded image into LaTeX source using a hosted multimodal model.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pic2word_server::transcribe::{GeminiTranscriber, Transcriber, mime_for_path};
//!
//! let transcriber = GeminiTranscriber::new(&config.gemini)?;
//! let latex = transcriber.transcribe(&bytes, &mime_for_path("scan.png")).await?;
//! ```

mod gemini;
mod provider;
mod types;

pub use gemini::GeminiTranscriber;
pub use provider::Transcriber;
pub use types::{mime_for_path, GenerationConfig, TranscriptionError, DEFAULT_IMAGE_MIME, LATEX_PROMPT};
