//! Error types for override sets.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for setup operations.
pub type SetupResult<T> = Result<T, SetupError>;

/// Errors that can occur while reading override sets.
#[derive(Debug, Error)]
pub enum SetupError {
    /// A setup file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A setup file is not valid JSON or has the wrong shape.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configured mode is outside `-1..=3`.
    #[error("mode {0} is out of range")]
    ModeOutOfRange(i64),
}
