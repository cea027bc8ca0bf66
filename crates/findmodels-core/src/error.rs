//! Error types for the model finder.
//!
//! Collaborator failures (host metadata, path config, remote search) are
//! represented here but are degraded at the engine boundary; only the
//! cache backends and the HTTP layer surface them to callers directly.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the model finder.
#[derive(Debug, Error)]
pub enum FinderError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    // Storage errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("Storage quota exceeded writing {key} (limit {limit_bytes} bytes)")]
    StorageQuotaExceeded { key: String, limit_bytes: u64 },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Input errors
    #[error("Invalid graph document: {message}")]
    InvalidGraph { message: String },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for model finder operations.
pub type Result<T> = std::result::Result<T, FinderError>;

impl From<std::io::Error> for FinderError {
    fn from(err: std::io::Error) -> Self {
        FinderError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for FinderError {
    fn from(err: serde_json::Error) -> Self {
        FinderError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for FinderError {
    fn from(err: rusqlite::Error) -> Self {
        FinderError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for FinderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FinderError::Timeout(std::time::Duration::from_secs(0))
        } else if let Some(status) = err.status() {
            FinderError::HttpStatus {
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
                status: status.as_u16(),
            }
        } else {
            FinderError::Network {
                message: err.to_string(),
                cause: Some(err.to_string()),
            }
        }
    }
}

impl FinderError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        FinderError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Whether a storage write failed because the backend ran out of room.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, FinderError::StorageQuotaExceeded { .. })
    }

    /// Whether this error came from talking to a remote collaborator.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            FinderError::Network { .. } | FinderError::Timeout(_) | FinderError::HttpStatus { .. }
        )
    }
}
