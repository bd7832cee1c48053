//! Conversion Types

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Output formats the service can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Docx,
}

impl OutputFormat {
    pub const ALL: &'static [OutputFormat] = &[OutputFormat::Docx];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Docx
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "docx" => Ok(Self::Docx),
            other => Err(ConversionError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversion error types
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Conversion I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to launch {program}: {source}")]
    LaunchFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed ({status}), output: {output}")]
    NonZeroExit {
        program: String,
        status: String,
        output: String,
    },

    #[error("Conversion timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("Converter produced no output file at {}", .0.display())]
    MissingOutput(PathBuf),
}

impl ConversionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::Io(_) => "conversion_io",
            Self::LaunchFailed { .. } => "converter_launch_failed",
            Self::NonZeroExit { .. } => "converter_failed",
            Self::Timeout(_) => "conversion_timeout",
            Self::MissingOutput(_) => "converter_missing_output",
        }
    }
}

/// Merge stdout and stderr of a finished process for diagnostics
pub fn combined_output(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);
    match (stdout.trim(), stderr.trim()) {
        ("", err) => err.to_string(),
        (out, "") => out.to_string(),
        (out, err) => format!("{}\n{}", out, err),
    }
}
