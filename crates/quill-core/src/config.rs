//! Configuration for quill-core
//!
//! Centralized configuration for the bibliography service connection, the
//! local cache and citation formatting behavior.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use quill_domain::{DEFAULT_HISTORY_CAPACITY, DEFAULT_RELOAD_WINDOW_MS};

/// System-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuillConfig {
    /// Bibliography service connection
    pub server: ServerConfig,
    /// Local bibliography cache
    pub cache: CacheConfig,
    /// Citation formatting behavior
    pub citations: CitationConfig,
}

/// Bibliography service connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the web application, e.g. `https://writer.example.org/`
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Sent as `X-CSRFToken` on every POST when set
    pub csrf_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/".to_string(),
            user_agent: concat!("quill/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
            csrf_token: None,
        }
    }
}

/// Local cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Use the cache to skip downloading an unchanged bibliography
    pub enabled: bool,
    /// Cache directory; defaults to the platform cache dir
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

impl CacheConfig {
    /// The configured directory, or `<platform cache dir>/quill`
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        self.dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|d| d.join("quill")))
    }
}

/// Citation formatting settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationConfig {
    /// Minimum interval between missing-entry reloads
    pub reload_window_ms: i64,
    /// Number of sync timestamps remembered per store
    pub history_capacity: usize,
    /// Style used when a document does not name one
    pub default_style: Option<String>,
}

impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            reload_window_ms: DEFAULT_RELOAD_WINDOW_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            default_style: None,
        }
    }
}

impl CitationConfig {
    pub fn reload_window(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.reload_window_ms)
    }
}

impl QuillConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a `.toml` or `.json` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents)?,
            _ => Self::from_toml(&contents)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("server.base_url".to_string()));
        }

        if url::Url::parse(&self.server.base_url).is_err() {
            return Err(ConfigError::OutOfRange(format!(
                "server.base_url is not a valid URL: {}",
                self.server.base_url
            )));
        }

        if self.server.timeout_secs == 0 {
            return Err(ConfigError::OutOfRange(
                "server.timeout_secs must be positive".to_string(),
            ));
        }

        if self.citations.reload_window_ms < 0 {
            return Err(ConfigError::OutOfRange(
                "citations.reload_window_ms must not be negative".to_string(),
            ));
        }

        if self.citations.history_capacity < 2 {
            return Err(ConfigError::OutOfRange(
                "citations.history_capacity must be at least 2".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration loading or validation error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Could not write TOML: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Value is out of valid range
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// Required field is missing
    #[error("Missing field: {0}")]
    MissingField(String),
}
