//! HTTP transport for the bibliography service

mod native;
mod service;

pub use native::*;
pub use service::*;

use thiserror::Error;

use crate::error::SyncError;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed: {message}")]
    RequestFailed { message: String },
    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },
    #[error("Timeout")]
    Timeout,
    #[error("Parse error: {message}")]
    ParseError { message: String },
}

impl From<HttpError> for SyncError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::ParseError { message } => SyncError::Decode(message),
            other => SyncError::Network {
                message: other.to_string(),
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
