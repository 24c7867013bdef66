//! Error types for backup and restore operations.

use std::io;

use sitevault_core::StoreError;
use thiserror::Error;

use super::format::DATA_ENTRY;

/// Errors that can occur during backup and restore operations.
#[derive(Debug, Error)]
pub enum BackupError {
    /// An I/O error occurred while reading or writing archive data or files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The zip container could not be read or written.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The XML document is not well-formed.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The document is well-formed but does not follow the backup format.
    #[error("malformed backup data at byte {position}: {message}")]
    Malformed {
        /// Byte offset into the XML document.
        position: u64,
        /// A description of the malformation.
        message: String,
    },

    /// The document declares a format version this build cannot read.
    #[error("unsupported backup version: {0}")]
    UnsupportedVersion(String),

    /// The archive has no XML document.
    #[error("failed to locate XML data file {}", DATA_ENTRY)]
    MissingDataEntry,

    /// A user or group referenced by the document does not exist.
    #[error("missing reference: {0}")]
    MissingReference(String),

    /// The domain to back up does not exist.
    #[error("domain not found: {0}")]
    DomainNotFound(String),

    /// The request failed validation before any work was done.
    #[error("{0}")]
    InvalidTarget(String),

    /// A file name in the document would escape its content directory.
    #[error("unsafe file name: {0}")]
    UnsafePath(String),

    /// The content store rejected an operation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl BackupError {
    /// Create a malformed data error with position context.
    pub fn malformed(position: u64, msg: impl Into<String>) -> Self {
        Self::Malformed { position, message: msg.into() }
    }

    /// Create a missing reference error.
    pub fn missing_reference(kind: &str, name: &str) -> Self {
        Self::MissingReference(format!("{kind} '{name}'"))
    }

    /// Create a pre-flight validation error.
    pub fn invalid_target(msg: impl Into<String>) -> Self {
        Self::InvalidTarget(msg.into())
    }

    /// Returns `true` for errors reported before any store mutation.
    #[must_use]
    pub const fn is_preflight(&self) -> bool {
        matches!(self, Self::InvalidTarget(_) | Self::DomainNotFound(_))
    }
}

/// A specialized `Result` type for backup operations.
pub type BackupResult<T> = Result<T, BackupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            BackupError::MissingDataEntry.to_string(),
            "failed to locate XML data file liquidsite.data"
        );
        assert_eq!(
            BackupError::malformed(42, "unexpected element <foo>").to_string(),
            "malformed backup data at byte 42: unexpected element <foo>"
        );
        assert_eq!(
            BackupError::missing_reference("group", "editors").to_string(),
            "missing reference: group 'editors'"
        );
    }

    #[test]
    fn test_preflight_classification() {
        assert!(BackupError::invalid_target("domain name is empty").is_preflight());
        assert!(BackupError::DomainNotFound("EXAMPLE".into()).is_preflight());
        assert!(!BackupError::MissingDataEntry.is_preflight());

        let store: BackupError = StoreError::security("no").into();
        assert!(!store.is_preflight());
    }
}
