//! Declarations exposed to templates.
//!
//! Each declaration kind is its own struct carrying only what that kind
//! needs; [`Declaration`] ties them together where code has to handle
//! any of them. Everything here serializes, which is how templates and
//! `annogen inspect --format json` see it.

use serde::Serialize;

/// Tag that exposes a top-level declaration.
pub const BINDING: &str = "binding";

/// Tag that suppresses a single struct field or enum constant.
pub const HIDDEN: &str = "hidden";

/// Anything that carries annotation tags.
pub trait Annotated {
    fn annotations(&self) -> &[String];

    fn has_annotation(&self, tag: &str) -> bool {
        self.annotations().iter().any(|a| a == tag)
    }

    /// Tagged `binding`.
    fn is_bound(&self) -> bool {
        self.has_annotation(BINDING)
    }

    /// Tagged `hidden`.
    fn is_hidden(&self) -> bool {
        self.has_annotation(HIDDEN)
    }
}

/// A struct definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructDecl {
    pub name: String,
    pub comment: Option<String>,
    pub annotations: Vec<String>,
    pub fields: Vec<Field>,
}

/// One struct member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub type_spelling: String,
    pub comment: Option<String>,
    pub annotations: Vec<String>,
}

/// An enum definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumDecl {
    pub name: String,
    pub comment: Option<String>,
    pub annotations: Vec<String>,
    pub constants: Vec<EnumConstant>,
}

/// One enumerator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumConstant {
    pub name: String,
    /// Value of the initializer, when one was written and could be evaluated.
    pub explicit: Option<i64>,
    /// The constant's value under C numbering rules.
    pub value: i64,
    pub comment: Option<String>,
    pub annotations: Vec<String>,
}

/// A typedef.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedefDecl {
    pub name: String,
    pub comment: Option<String>,
    pub annotations: Vec<String>,
    pub underlying: String,
}

/// A function declaration or definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDecl {
    pub name: String,
    pub comment: Option<String>,
    pub annotations: Vec<String>,
    pub return_type: String,
    pub parameters: Vec<Parameter>,
    pub is_variadic: bool,
}

/// One function parameter. Unnamed parameters have an empty name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_spelling: String,
}

/// Any top-level declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Declaration {
    Struct(StructDecl),
    Enum(EnumDecl),
    Typedef(TypedefDecl),
    Function(FunctionDecl),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Struct(s) => &s.name,
            Declaration::Enum(e) => &e.name,
            Declaration::Typedef(t) => &t.name,
            Declaration::Function(f) => &f.name,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match self {
            Declaration::Struct(s) => s.comment.as_deref(),
            Declaration::Enum(e) => e.comment.as_deref(),
            Declaration::Typedef(t) => t.comment.as_deref(),
            Declaration::Function(f) => f.comment.as_deref(),
        }
    }

    /// Short kind label, as used in listings.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Declaration::Struct(_) => "struct",
            Declaration::Enum(_) => "enum",
            Declaration::Typedef(_) => "typedef",
            Declaration::Function(_) => "function",
        }
    }

    /// Whether the declaration names a type other declarations can use.
    pub fn is_type(&self) -> bool {
        !matches!(self, Declaration::Function(_))
    }
}

impl Annotated for Declaration {
    fn annotations(&self) -> &[String] {
        match self {
            Declaration::Struct(s) => &s.annotations,
            Declaration::Enum(e) => &e.annotations,
            Declaration::Typedef(t) => &t.annotations,
            Declaration::Function(f) => &f.annotations,
        }
    }
}

macro_rules! impl_annotated {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Annotated for $ty {
                fn annotations(&self) -> &[String] {
                    &self.annotations
                }
            }
        )*
    };
}

impl_annotated!(StructDecl, Field, EnumDecl, EnumConstant, TypedefDecl, FunctionDecl);
