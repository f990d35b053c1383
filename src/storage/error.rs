//! Error types for storage operations

use std::fmt;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations
#[derive(Debug)]
pub enum StorageError {
    /// Backend could not be reached when connecting
    ConnectionFailed(String),

    /// Write attempted by a writer whose connection was never established
    NotConnected(String),

    /// Backend rejected a write
    WriteRejected { status: u16, body: String },

    /// Transport failure while talking to the backend
    Http(reqwest::Error),

    /// Invalid configuration
    InvalidConfig(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionFailed(msg) => {
                write!(f, "failed to connect to storage backend: {}", msg)
            }
            StorageError::NotConnected(msg) => {
                write!(f, "no connection to storage backend: {}", msg)
            }
            StorageError::WriteRejected { status, body } => {
                write!(f, "storage backend rejected write ({}): {}", status, body.trim())
            }
            StorageError::Http(err) => write!(f, "storage request failed: {}", err),
            StorageError::InvalidConfig(msg) => write!(f, "invalid storage configuration: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        StorageError::Http(err)
    }
}
