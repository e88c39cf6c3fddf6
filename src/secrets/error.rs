//! Error types for credential store operations.

use thiserror::Error;

/// Result type for credential store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while talking to a credential store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store cannot be located or reached at all.
    #[error("Credential store unavailable: {message}")]
    Unavailable { message: String },

    /// A single write was rejected or failed.
    #[error("Failed to store credential '{id}': {reason}")]
    WriteFailed { id: String, reason: String },

    /// Credential not found in the store.
    #[error("Credential not found: {id}")]
    NotFound { id: String },

    /// A credential with the same id already exists.
    #[error("Credential already exists: {id}")]
    AlreadyExists { id: String },

    /// Backend-specific error.
    #[error("Backend error: {message}")]
    BackendError { message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StoreError {
    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }

    /// Create a write failed error.
    pub fn write_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WriteFailed { id: id.into(), reason: reason.into() }
    }

    /// Create a not found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create an already exists error.
    pub fn already_exists(id: impl Into<String>) -> Self {
        Self::AlreadyExists { id: id.into() }
    }

    /// Create a backend error.
    pub fn backend_error(message: impl Into<String>) -> Self {
        Self::BackendError { message: message.into() }
    }

    /// Create a config error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError { message: message.into() }
    }

    /// Whether the store itself could not be reached, as opposed to a single
    /// operation failing.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::ConfigError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        let err = StoreError::not_found("abc");
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(err.to_string(), "Credential not found: abc");

        let err = StoreError::write_failed("abc", "disk full");
        assert_eq!(err.to_string(), "Failed to store credential 'abc': disk full");
        assert!(!err.is_unavailable());
    }

    #[test]
    fn test_unavailable_classification() {
        assert!(StoreError::unavailable("no such store").is_unavailable());
        assert!(StoreError::config_error("missing address").is_unavailable());
        assert!(!StoreError::backend_error("timeout").is_unavailable());
    }
}
