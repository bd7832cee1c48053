//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::convert::DocumentConverter;
use crate::temp::TempStore;
use crate::transcribe::Transcriber;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    temp: TempStore,
    transcriber: Arc<dyn Transcriber>,
    converter: Arc<dyn DocumentConverter>,
}

impl AppState {
    /// Create state from explicit components
    pub fn new(
        config: Config,
        transcriber: Arc<dyn Transcriber>,
        converter: Arc<dyn DocumentConverter>,
    ) -> Self {
        let temp = TempStore::new(config.temp_dir.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                temp,
                transcriber,
                converter,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the temp file store
    pub fn temp(&self) -> &TempStore {
        &self.inner.temp
    }

    /// Get the transcription client
    pub fn transcriber(&self) -> &dyn Transcriber {
        self.inner.transcriber.as_ref()
    }

    /// Get the document converter
    pub fn converter(&self) -> &dyn DocumentConverter {
        self.inner.converter.as_ref()
    }
}
