//! Configuration management for pic2word server
//!
//! All settings come from environment variables (optionally seeded from a
//! `.env` file). The resulting [`Config`] is built once at startup and handed
//! to every component through [`crate::state::AppState`].

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::temp::TempStore;

/// Default Gemini REST endpoint
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model used for transcription
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to create temp directory {path}: {source}")]
    TempDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub gemini: GeminiConfig,
    pub converter: ConverterConfig,
    pub temp_dir: PathBuf,
    pub allow_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub env: String,
    /// Overall deadline for one conversion request, in seconds
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub project_id: String,
    pub location: String,
    pub model: String,
    pub base_url: String,
    /// Budget for an in-pipeline transcription call, in seconds
    pub request_timeout: u64,
    /// Budget for a standalone key validation call, in seconds
    pub validation_timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConverterConfig {
    /// Converter executable (resolved through PATH when not absolute)
    pub program: String,
    pub timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                env: "development".to_string(),
                request_timeout: 120,
            },
            gemini: GeminiConfig {
                api_key: String::new(),
                project_id: String::new(),
                location: "us-central1".to_string(),
                model: DEFAULT_GEMINI_MODEL.to_string(),
                base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
                request_timeout: 30,
                validation_timeout: 15,
            },
            converter: ConverterConfig {
                program: "pandoc".to_string(),
                timeout: 60,
            },
            temp_dir: PathBuf::from("./tmp"),
            allow_origins: vec!["http://localhost:5173".to_string()],
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated the same as missing ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: get("HOST").unwrap_or(defaults.server.host),
                port: parse_or("PORT", get("PORT"), defaults.server.port)?,
                env: get("ENV").unwrap_or(defaults.server.env),
                request_timeout: parse_or(
                    "REQUEST_TIMEOUT_SECS",
                    get("REQUEST_TIMEOUT_SECS"),
                    defaults.server.request_timeout,
                )?,
            },
            gemini: GeminiConfig {
                api_key: get("GOOGLE_API_KEY").unwrap_or_default(),
                project_id: get("GOOGLE_PROJECT_ID").unwrap_or_default(),
                location: get("GOOGLE_LOCATION").unwrap_or(defaults.gemini.location),
                model: get("GEMINI_MODEL").unwrap_or(defaults.gemini.model),
                base_url: get("GEMINI_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.gemini.base_url),
                ..defaults.gemini
            },
            converter: ConverterConfig {
                program: get("PANDOC_PATH").unwrap_or(defaults.converter.program),
                timeout: parse_or(
                    "PANDOC_TIMEOUT_SECS",
                    get("PANDOC_TIMEOUT_SECS"),
                    defaults.converter.timeout,
                )?,
            },
            temp_dir: get("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            allow_origins: match get("ALLOW_ORIGINS") {
                Some(raw) => split_origins(&raw)?,
                None => defaults.allow_origins,
            },
            max_upload_bytes: parse_or::<usize>("MAX_UPLOAD_MB", get("MAX_UPLOAD_MB"), 20)?
                .saturating_mul(1024 * 1024),
        })
    }

    /// Create the temp directory (and parents) if it does not exist yet
    pub fn ensure_temp_dir(&self) -> Result<(), ConfigError> {
        TempStore::new(self.temp_dir.clone())
            .ensure_exists()
            .map_err(|source| ConfigError::TempDir {
                path: self.temp_dir.clone(),
                source,
            })
    }

    pub fn is_production(&self) -> bool {
        self.server.env == "production"
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout)
    }
}

impl GeminiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn validation_timeout(&self) -> Duration {
        Duration::from_secs(self.validation_timeout)
    }

    /// First characters of the API key, safe to print in logs
    pub fn masked_key(&self) -> Option<String> {
        if self.api_key.chars().count() > 5 {
            Some(format!("{}***", self.api_key.chars().take(5).collect::<String>()))
        } else {
            None
        }
    }
}

impl ConverterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

fn parse_or<T>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}

/// Comma-separated origin list. Credentials are allowed, so `*` is refused.
fn split_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    let mut origins: Vec<String> = Vec::new();
    for origin in raw.split(',').map(str::trim).filter(|o| !o.is_empty()) {
        if origin == "*" {
            return Err(ConfigError::InvalidValue {
                key: "ALLOW_ORIGINS",
                value: raw.to_string(),
                reason: "wildcard origin cannot be combined with credentials; list the origins explicitly"
                    .to_string(),
            });
        }
        if !origins.iter().any(|o| o == origin) {
            origins.push(origin.to_string());
        }
    }
    Ok(origins)
}
