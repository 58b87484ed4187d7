//! Parser error types.

/// Errors that can occur while reading a C header.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The tokenizer hit something it cannot read.
    #[error("line {line}: {detail}")]
    Lex { line: u32, detail: String },

    /// A bracket was opened and never closed, or closed without being opened.
    #[error("line {line}: unbalanced '{bracket}'")]
    Unbalanced { line: u32, bracket: char },

    /// A declaration could not be understood.
    #[error("line {line}: {detail}")]
    Syntax { line: u32, detail: String },
}

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, ParseError>;
