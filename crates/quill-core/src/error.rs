//! Error types for quill-core

use thiserror::Error;

use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::sync::WireError;

/// Result type alias for quill operations
pub type Result<T> = std::result::Result<T, QuillError>;

/// Main error type for quill operations
#[derive(Error, Debug)]
pub enum QuillError {
    /// Talking to the bibliography service failed
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Reading or writing the local cache failed
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Configuration could not be loaded or is invalid
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Failure of a request to the bibliography service.
///
/// A failed operation leaves the store untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// The request never produced a response
    #[error("Request failed: {message}")]
    Network { message: String },

    /// The server rejected the request
    #[error("Server returned status {status}: {message}")]
    Server { status: u16, message: String },

    /// The response body was not what the protocol promises
    #[error("Invalid response: {0}")]
    Decode(String),

    /// An entry could not be converted to or from its transport form
    #[error("Invalid entry data: {0}")]
    Wire(#[from] WireError),
}

impl SyncError {
    /// Text shown to the user in an error notification
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Server { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}
