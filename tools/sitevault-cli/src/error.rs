//! Error types for the CLI.

use thiserror::Error;

/// CLI-specific result type.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
pub enum CliError {
    /// No store specified.
    #[error("no store specified. Use --store or set SITEVAULT_STORE environment variable")]
    NoStoreSpecified,

    /// Content store error.
    #[error("store error: {0}")]
    Store(#[from] sitevault_core::StoreError),

    /// Backup or restore error.
    #[error("{0}")]
    Backup(#[from] sitevault::BackupError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid log filter directive.
    #[error("invalid log filter: {0}")]
    LogFilter(#[from] tracing_subscriber::filter::ParseError),
}
