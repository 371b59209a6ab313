//! Error types for the Synex system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynexError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity} '{key}'")]
    AlreadyExists { entity: String, key: String },

    #[error("Entity in use: {entity} with id {id} is still referenced by {references} active binding(s)")]
    InUse {
        entity: String,
        id: String,
        references: u64,
    },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    /// Access denied. Carries no cause so callers cannot tell a missing
    /// permission from a failed check.
    #[error("Access denied")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SynexError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn already_exists(entity: &str, key: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity: entity.into(),
            key: key.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True for failures of the underlying store, as opposed to
    /// rejections detected before any mutation.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Internal(_))
    }
}

pub type SynexResult<T> = Result<T, SynexError>;
