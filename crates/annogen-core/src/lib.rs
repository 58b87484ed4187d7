//! Entity model and transformations for annogen.
//!
//! Takes the cursor tree produced by `annogen-cparse` and turns it into
//! the data templates are rendered from:
//!
//! - [`extract`]: Classifies top-level cursors into structs, enums,
//!   typedefs and functions, numbering enum constants along the way
//! - [`filter`]: Keeps `binding` declarations, drops `hidden` members and
//!   computes the custom-type universe
//! - [`typemap`]: Maps C type spellings to target types
//! - [`comment`]: Rewrites raw comments as doc-blocks, line comments or
//!   inline docstrings
//! - [`consteval`]: Integer constant expressions in enum initializers

pub mod comment;
pub mod consteval;
pub mod entity;
pub mod error;
pub mod extract;
pub mod filter;
pub mod typemap;

// Re-exports for convenience.
pub use comment::{transform_comment, CommentStyle};
pub use entity::{
    Annotated, Declaration, EnumConstant, EnumDecl, Field, FunctionDecl, Parameter, StructDecl,
    TypedefDecl, BINDING, HIDDEN,
};
pub use error::{CoreError, Result};
pub use extract::{extract, Entities};
pub use filter::{bound, custom_type_universe, CustomTypes};
pub use typemap::{map_type, TargetType};
