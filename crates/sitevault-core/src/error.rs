//! Error types for content store operations.

use std::io;

use thiserror::Error;

/// Errors that can occur when talking to a content store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced object does not exist.
    #[error("{kind} not found: {name}")]
    NotFound {
        /// The kind of object (domain, user, group, ...).
        kind: &'static str,
        /// The name or identifier that was looked up.
        name: String,
    },

    /// The object conflicts with data already in the store.
    ///
    /// Host names are unique across all domains, so restoring a host that
    /// another domain already registered fails with this variant.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The acting user is not allowed to perform the operation.
    #[error("access denied: {0}")]
    Security(String),

    /// The object failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A stored record could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The underlying storage engine failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// An I/O error occurred in the files directory.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    /// Create a not-found error.
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound { kind, name: name.into() }
    }

    /// Create a conflict error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a security error.
    pub fn security(msg: impl Into<String>) -> Self {
        Self::Security(msg.into())
    }

    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Returns `true` if the error is a data conflict.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Returns `true` if the error is an authorization failure.
    #[must_use]
    pub const fn is_security(&self) -> bool {
        matches!(self, Self::Security(_))
    }
}

/// A specialized `Result` type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_predicates() {
        assert!(StoreError::conflict("host taken").is_conflict());
        assert!(!StoreError::conflict("host taken").is_security());
        assert!(StoreError::security("not an admin").is_security());
        assert!(!StoreError::storage("disk").is_conflict());
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::not_found("user", "alice");
        assert_eq!(err.to_string(), "user not found: alice");

        let err = StoreError::conflict("host 'www.example.com' already exists");
        assert_eq!(err.to_string(), "conflict: host 'www.example.com' already exists");
    }
}
