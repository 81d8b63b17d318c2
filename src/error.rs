//! Error types for pagetrack.

use thiserror::Error;

/// Errors surfaced by the fetch pipeline, the stores and configuration.
#[derive(Error, Debug)]
pub enum TrackError {
    /// The HTTP request or body read failed.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The key-value store rejected a command or could not be reached.
    #[error("Store error: {0}")]
    Store(String),

    /// A stored value could not be decoded into the expected type.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<redis::RedisError> for TrackError {
    fn from(err: redis::RedisError) -> Self {
        TrackError::Store(err.to_string())
    }
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, TrackError>;
