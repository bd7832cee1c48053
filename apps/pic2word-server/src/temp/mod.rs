//! Temporary file management
//!
//! Every intermediate artifact of a conversion (uploaded image, generated
//! LaTeX source, produced document) lives under one configured directory and
//! is owned by a [`TempFile`] guard. Dropping the guard deletes the file, so
//! cleanup happens on every exit path of a request, including early returns,
//! errors and client disconnects.

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Longest file name component kept from a client-supplied upload name
const MAX_NAME_LEN: usize = 100;

/// Factory for uniquely named files under a single directory
#[derive(Debug, Clone)]
pub struct TempStore {
    root: PathBuf,
}

impl TempStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory (and parents) if missing
    pub fn ensure_exists(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }

    /// `<root>/<prefix>_<uuid>.<extension>`
    pub fn unique_path(&self, prefix: &str, extension: &str) -> PathBuf {
        self.root
            .join(format!("{}_{}.{}", prefix, Uuid::new_v4().simple(), extension))
    }

    /// Path for a persisted upload: `<root>/<timestamp>_<uuid>_<safe name>`
    pub fn upload_path(&self, timestamp: &str, original_name: &str) -> PathBuf {
        self.root.join(format!(
            "{}_{}_{}",
            timestamp,
            Uuid::new_v4().simple(),
            sanitize_file_name(original_name)
        ))
    }

    /// Write `data` to `path` and return the owning guard.
    ///
    /// A partially written file is removed before the error is returned.
    pub async fn write(&self, path: PathBuf, data: &[u8]) -> io::Result<TempFile> {
        let file = TempFile::adopt(path);
        tokio::fs::write(file.path(), data).await?;
        Ok(file)
    }
}

/// Owner of a single temporary file.
///
/// The file is removed at most once: either explicitly through
/// [`TempFile::remove`] or implicitly when the guard is dropped.
#[derive(Debug)]
pub struct TempFile {
    path: Option<PathBuf>,
}

impl TempFile {
    /// Take ownership of `path`, whether or not the file exists yet
    pub fn adopt(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    pub async fn exists(&self) -> bool {
        match &self.path {
            Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            None => false,
        }
    }

    /// Read the whole file into memory
    pub async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.path()).await
    }

    /// Delete the file now. A file that is already gone is not an error.
    pub async fn remove(mut self) -> io::Result<()> {
        match self.path.take() {
            Some(path) => match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "Removed temp file");
                    Ok(())
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e),
            },
            None => Ok(()),
        }
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed temp file"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to remove temp file"
                ),
            }
        }
    }
}

/// Reduce a client-supplied file name to a safe single path component
pub fn sanitize_file_name(name: &str) -> String {
    // Clients may send either separator
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        return "upload".to_string();
    }

    if cleaned.chars().count() <= MAX_NAME_LEN {
        return cleaned.to_string();
    }

    // Keep the extension, it drives MIME detection
    match cleaned.rsplit_once('.') {
        Some((stem, ext)) if ext.chars().count() < 10 => {
            let keep = MAX_NAME_LEN - ext.chars().count() - 1;
            format!("{}.{}", stem.chars().take(keep).collect::<String>(), ext)
        }
        _ => cleaned.chars().take(MAX_NAME_LEN).collect(),
    }
}
