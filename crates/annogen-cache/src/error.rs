//! Cache error types.

use std::path::PathBuf;

/// Errors that can occur while reading or writing stamps.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A tracked file does not exist.
    #[error("tracked file not found: {path}")]
    Missing { path: PathBuf },

    /// Filesystem failure on a stamp or tracked file.
    #[error("cache error at {path}: {detail}")]
    Io { path: PathBuf, detail: String },
}

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
