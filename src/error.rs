//! Error types for ChatZone.

use thiserror::Error;

use crate::auth::{LoginError, PasswordError, PermissionError};
use crate::chat::JoinError;
use crate::moderation::ModerationError;

/// Common error type for ChatZone.
#[derive(Error, Debug)]
pub enum ChatzoneError {
    /// Database error.
    ///
    /// Errors from sqlx and from (de)serializing stored values end up here.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for caller input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Reply generation error.
    #[error("bot error: {0}")]
    Bot(String),

    /// Login was refused.
    #[error(transparent)]
    Login(#[from] LoginError),

    /// Room join was refused.
    #[error(transparent)]
    Join(#[from] JoinError),

    /// Moderation action failed.
    #[error(transparent)]
    Moderation(#[from] ModerationError),

    /// The acting identity is not allowed to perform the operation.
    #[error(transparent)]
    Permission(#[from] PermissionError),

    /// Credential hashing failed.
    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl From<sqlx::Error> for ChatzoneError {
    fn from(e: sqlx::Error) -> Self {
        ChatzoneError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for ChatzoneError {
    fn from(e: serde_json::Error) -> Self {
        ChatzoneError::Database(format!("stored value is malformed: {e}"))
    }
}

/// Result type alias for ChatZone operations.
pub type Result<T> = std::result::Result<T, ChatzoneError>;
