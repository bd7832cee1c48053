//! Pandoc runner
//!
//! Converts LaTeX to DOCX by running `pandoc -f latex -t docx -o <out> <in>`.
//! The source is written to a uniquely named temp file, the child process is
//! awaited with a timeout and killed if the request goes away.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::converter::DocumentConverter;
use super::types::{combined_output, ConversionError};
use crate::config::ConverterConfig;
use crate::temp::{TempFile, TempStore};

/// LaTeX to DOCX converter backed by the pandoc executable
pub struct PandocConverter {
    program: String,
    timeout: Duration,
    temp: TempStore,
}

impl PandocConverter {
    pub fn new(config: &ConverterConfig, temp: TempStore) -> Self {
        Self {
            program: config.program.clone(),
            timeout: config.timeout(),
            temp,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Get the converter version line
    pub async fn version(&self) -> Result<String, ConversionError> {
        let output = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ConversionError::LaunchFailed {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ConversionError::NonZeroExit {
                program: self.program.clone(),
                status: output.status.to_string(),
                output: combined_output(&output.stdout, &output.stderr),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}

#[async_trait]
impl DocumentConverter for PandocConverter {
    fn name(&self) -> &'static str {
        "pandoc"
    }

    async fn is_available(&self) -> bool {
        let result = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        matches!(result, Ok(status) if status.success())
    }

    async fn latex_to_docx(&self, latex: &str) -> Result<TempFile, ConversionError> {
        tracing::debug!(chars = latex.chars().count(), "Starting LaTeX to DOCX conversion");

        let source = self
            .temp
            .write(self.temp.unique_path("latex", "tex"), latex.as_bytes())
            .await?;
        let document = TempFile::adopt(self.temp.unique_path("document", "docx"));

        let mut cmd = Command::new(&self.program);
        cmd.arg("-f")
            .arg("latex")
            .arg("-t")
            .arg("docx")
            .arg("-o")
            .arg(document.path())
            .arg(source.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(ConversionError::LaunchFailed {
                    program: self.program.clone(),
                    source,
                })
            }
            Err(_) => {
                tracing::warn!(program = %self.program, timeout = ?self.timeout, "Converter timed out");
                return Err(ConversionError::Timeout(self.timeout));
            }
        };

        if let Err(e) = source.remove().await {
            tracing::warn!(error = %e, "Failed to remove LaTeX source");
        }

        if !output.status.success() {
            let combined = combined_output(&output.stdout, &output.stderr);
            tracing::warn!(
                program = %self.program,
                status = %output.status,
                output = %combined,
                "Converter failed"
            );
            return Err(ConversionError::NonZeroExit {
                program: self.program.clone(),
                status: output.status.to_string(),
                output: combined,
            });
        }

        if !document.exists().await {
            return Err(ConversionError::MissingOutput(document.path().to_path_buf()));
        }

        tracing::info!(path = %document.path().display(), "Converter produced document");
        Ok(document)
    }
}
