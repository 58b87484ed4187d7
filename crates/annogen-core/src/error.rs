//! Core error types.

use annogen_cparse::ParseError;

/// Errors that can occur while building entities from a header.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The header could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// An enum initializer is not an integer constant expression.
    #[error("cannot evaluate '{expr}': {detail}")]
    Eval { expr: String, detail: String },
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
