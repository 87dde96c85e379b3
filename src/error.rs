use std::fmt;
use triage_session::{RemoteError, StorageError, TriageError};

/// Central error types for the photo triage app
#[derive(Debug)]
pub enum AppError {
    /// Configuration file missing or invalid
    Config(String),
    /// Database error (rusqlite)
    Database(rusqlite::Error),
    /// Filesystem error
    Filesystem(std::io::Error),
    /// Local key/value storage error
    Storage(StorageError),
    /// WebDAV listing or mutation error
    Remote(RemoteError),
    /// Session engine error
    Triage(TriageError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Filesystem(e) => write!(f, "Filesystem error: {}", e),
            AppError::Storage(e) => write!(f, "Storage error: {}", e),
            AppError::Remote(e) => write!(f, "Remote error: {}", e),
            AppError::Triage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AppError {}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Filesystem(e)
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Storage(e)
    }
}

impl From<RemoteError> for AppError {
    fn from(e: RemoteError) -> Self {
        AppError::Remote(e)
    }
}

impl From<TriageError> for AppError {
    fn from(e: TriageError) -> Self {
        AppError::Triage(e)
    }
}
