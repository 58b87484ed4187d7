//! The cursor tree produced by the parser.

use std::fmt;

use crate::error::Result;
use crate::lexer::Lexer;
use crate::parser::Parser;

/// What a cursor declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorKind {
    StructDecl,
    UnionDecl,
    EnumDecl,
    TypedefDecl,
    FunctionDecl,
    VarDecl,
    FieldDecl,
    EnumConstantDecl,
    ParmDecl,
}

impl fmt::Display for CursorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CursorKind::StructDecl => "struct",
            CursorKind::UnionDecl => "union",
            CursorKind::EnumDecl => "enum",
            CursorKind::TypedefDecl => "typedef",
            CursorKind::FunctionDecl => "function",
            CursorKind::VarDecl => "variable",
            CursorKind::FieldDecl => "field",
            CursorKind::EnumConstantDecl => "enum constant",
            CursorKind::ParmDecl => "parameter",
        };
        write!(f, "{s}")
    }
}

/// One declaration in the tree.
///
/// `type_spelling` depends on the kind: the declared type for fields,
/// parameters and variables, the underlying type for typedefs, the return
/// type for functions and `struct Name` / `enum Name` for tag declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub kind: CursorKind,
    pub name: String,
    pub type_spelling: String,
    /// Raw comment text, delimiters included.
    pub comment: Option<String>,
    pub annotations: Vec<String>,
    /// Fields, enum constants or parameters, in source order.
    pub children: Vec<Cursor>,
    /// Initializer expression text of an enum constant.
    pub initializer: Option<String>,
    pub is_variadic: bool,
    /// Has a body (`{ ... }`), as opposed to a forward declaration.
    pub is_definition: bool,
    pub line: u32,
}

impl Cursor {
    /// Create a bare cursor of the given kind.
    pub fn new(kind: CursorKind, name: impl Into<String>, line: u32) -> Self {
        Self {
            kind,
            name: name.into(),
            type_spelling: String::new(),
            comment: None,
            annotations: Vec::new(),
            children: Vec::new(),
            initializer: None,
            is_variadic: false,
            is_definition: false,
            line,
        }
    }

    /// Whether the cursor carries the given annotation tag.
    pub fn has_annotation(&self, tag: &str) -> bool {
        self.annotations.iter().any(|a| a == tag)
    }

    /// Iterate over children of one kind.
    pub fn children_of(&self, kind: CursorKind) -> impl Iterator<Item = &Cursor> {
        self.children.iter().filter(move |c| c.kind == kind)
    }
}

/// A parsed header: its top-level cursors in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationUnit {
    pub cursors: Vec<Cursor>,
}

impl TranslationUnit {
    /// Parse C header text.
    pub fn parse(source: &str) -> Result<Self> {
        let lexed = Lexer::new(source).tokenize()?;
        let cursors = Parser::new(&lexed).parse()?;
        Ok(Self { cursors })
    }

    /// Immediate children of the translation unit.
    pub fn children(&self) -> &[Cursor] {
        &self.cursors
    }
}
