//! C declaration parser for annogen.
//!
//! Turns C header text into a flat list of top-level [`Cursor`]s, each
//! carrying its kind, name, type spelling, preceding comment and
//! `__attribute__((annotate("...")))` tags. Only the declaration subset of
//! C that headers actually use is understood; macros are not expanded.
//!
//! ## Modules
//!
//! - [`lexer`]: Tokenizer that keeps comments on a side channel
//! - [`types`]: Canonical spelling of builtin type specifiers
//! - [`cursor`]: The cursor tree handed to consumers
//! - [`parser`]: Declaration parser

pub mod cursor;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod types;

pub use cursor::{Cursor, CursorKind, TranslationUnit};
pub use error::ParseError;
