//! Error types for cardlog.

use thiserror::Error;

/// Result type alias using cardlog's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cardlog operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Synced storage read or write failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
