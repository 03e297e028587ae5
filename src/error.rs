//! Error handling for the fitness tracker app core

use std::fmt;
use thiserror::Error;

use crate::validation::ValidationErrors;
use fitness_tracker_auth::AuthError;

/// Unified error type for the app core
#[derive(Error, Debug)]
pub enum Error {
    /// Failures reported by the remote authentication provider
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem errors from the on-device store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key-value store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Form input rejected before reaching the provider
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Create a new storage error
    pub fn storage<T: fmt::Display>(msg: T) -> Self {
        Error::Storage(msg.to_string())
    }
}
