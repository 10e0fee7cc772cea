//! Error types for registry watching and notification delivery
//!
//! Network-stage failures (auth, manifest fetch, notification) are always
//! contained at the (repository, tag) level by their callers. Only
//! configuration and state-loading failures surface as hard errors.

pub mod handlers;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WatchError>;

#[derive(Debug, Clone, Error)]
pub enum WatchError {
    /// Token issuance failed; every tag of the repository is skipped
    #[error("Authentication failed for {repository}: {cause}")]
    Auth { repository: String, cause: String },

    /// A single manifest could not be retrieved
    #[error("Manifest fetch failed for {repository}:{tag}: {cause}")]
    ManifestFetch {
        repository: String,
        tag: String,
        cause: String,
    },

    /// A single notification delivery failed
    #[error("Notification failed for {project}:{tag}: {cause}")]
    Notification {
        project: String,
        tag: String,
        cause: String,
    },

    /// Saving or loading the state blob failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for WatchError {
    fn from(err: std::io::Error) -> Self {
        WatchError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for WatchError {
    fn from(err: serde_json::Error) -> Self {
        WatchError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for WatchError {
    fn from(err: reqwest::Error) -> Self {
        WatchError::Network(err.to_string())
    }
}

impl From<url::ParseError> for WatchError {
    fn from(err: url::ParseError) -> Self {
        WatchError::Config(err.to_string())
    }
}

impl From<base64::DecodeError> for WatchError {
    fn from(err: base64::DecodeError) -> Self {
        WatchError::Persistence(format!("Invalid base64 state blob: {}", err))
    }
}
