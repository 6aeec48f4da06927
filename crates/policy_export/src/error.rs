//! Error types for export operations.

use thiserror::Error;

/// Errors that can occur while exporting or locking a policy.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to serialize output.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Lockfile format version this build does not understand.
    #[error("unsupported lockfile version {found} (expected {expected})")]
    UnsupportedLockVersion {
        /// Version found in the file.
        found: u32,
        /// Version this build writes.
        expected: u32,
    },

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML serialization error.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, Error>;
