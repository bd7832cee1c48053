//! Document converter trait

use async_trait::async_trait;

use super::types::ConversionError;
use crate::temp::TempFile;

/// Turns LaTeX source into a Word document on local disk
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Converter name for logs
    fn name(&self) -> &'static str;

    /// Check if the converter can be run on this host
    async fn is_available(&self) -> bool;

    /// Convert `latex` into a `.docx` file.
    ///
    /// The returned guard owns the produced document; every intermediate file
    /// is already gone when this returns, on success and on failure.
    async fn latex_to_docx(&self, latex: &str) -> Result<TempFile, ConversionError>;
}
