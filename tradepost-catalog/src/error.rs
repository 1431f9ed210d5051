//! Error types for the catalog layer.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur while reading catalog sources.
///
/// Lookups never fail; a missing dataset, category or item is `None`.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A source file or directory could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source record is not valid JSON or has the wrong shape.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A source record parsed but cannot become a dataset.
    #[error("invalid dataset record {path}: {reason}")]
    InvalidRecord { path: PathBuf, reason: String },
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
