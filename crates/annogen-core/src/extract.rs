//! Entity extraction from a parsed header.
//!
//! Only immediate children of the translation unit are classified; nested
//! definitions are reachable through the type spelling of the field that
//! uses them. Enum constants are numbered here, before any filtering, so
//! a hidden enumerator still takes its place in the sequence.

use std::collections::HashMap;

use annogen_cparse::{Cursor, CursorKind, TranslationUnit};
use serde::Serialize;

use crate::consteval;
use crate::entity::{
    Declaration, EnumConstant, EnumDecl, Field, FunctionDecl, Parameter, StructDecl, TypedefDecl,
};
use crate::error::Result;

/// The four ordered declaration collections of one header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Entities {
    pub structs: Vec<StructDecl>,
    pub enums: Vec<EnumDecl>,
    pub typedefs: Vec<TypedefDecl>,
    pub functions: Vec<FunctionDecl>,
}

impl Entities {
    /// Parse header text and extract its entities.
    pub fn from_source(source: &str) -> Result<Self> {
        let unit = TranslationUnit::parse(source)?;
        Ok(extract(&unit))
    }

    /// Total number of declarations.
    pub fn len(&self) -> usize {
        self.structs.len() + self.enums.len() + self.typedefs.len() + self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All declarations, grouped by kind in the order structs, enums,
    /// typedefs, functions.
    pub fn declarations(&self) -> Vec<Declaration> {
        let structs = self.structs.iter().cloned().map(Declaration::Struct);
        let enums = self.enums.iter().cloned().map(Declaration::Enum);
        let typedefs = self.typedefs.iter().cloned().map(Declaration::Typedef);
        let functions = self.functions.iter().cloned().map(Declaration::Function);
        structs.chain(enums).chain(typedefs).chain(functions).collect()
    }
}

/// Classify the top-level cursors of `unit`.
pub fn extract(unit: &TranslationUnit) -> Entities {
    let mut entities = Entities::default();
    let mut scope: HashMap<String, i64> = HashMap::new();

    for cursor in unit.children() {
        match cursor.kind {
            CursorKind::StructDecl if cursor.is_definition => {
                entities.structs.push(struct_decl(cursor));
            }
            CursorKind::EnumDecl if cursor.is_definition => {
                entities.enums.push(enum_decl(cursor, &mut scope));
            }
            CursorKind::TypedefDecl => entities.typedefs.push(TypedefDecl {
                name: cursor.name.clone(),
                comment: cursor.comment.clone(),
                annotations: cursor.annotations.clone(),
                underlying: cursor.type_spelling.clone(),
            }),
            CursorKind::FunctionDecl => entities.functions.push(function_decl(cursor)),
            kind => log::debug!(
                "line {}: not extracting {kind} '{}'",
                cursor.line,
                cursor.name
            ),
        }
    }

    entities
}

fn struct_decl(cursor: &Cursor) -> StructDecl {
    StructDecl {
        name: cursor.name.clone(),
        comment: cursor.comment.clone(),
        annotations: cursor.annotations.clone(),
        fields: cursor
            .children_of(CursorKind::FieldDecl)
            .map(|field| Field {
                name: field.name.clone(),
                type_spelling: field.type_spelling.clone(),
                comment: field.comment.clone(),
                annotations: field.annotations.clone(),
            })
            .collect(),
    }
}

/// Number the constants of one enum: an unspecified constant is the
/// previous value plus one, starting at zero.
fn enum_decl(cursor: &Cursor, scope: &mut HashMap<String, i64>) -> EnumDecl {
    let mut next = 0i64;
    let mut constants = Vec::new();

    for constant in cursor.children_of(CursorKind::EnumConstantDecl) {
        let explicit = constant
            .initializer
            .as_deref()
            .and_then(|expr| match consteval::evaluate(expr, &*scope) {
                Ok(value) => Some(value),
                Err(e) => {
                    log::warn!(
                        "line {}: {e}; numbering '{}' as if it had no initializer",
                        constant.line,
                        constant.name
                    );
                    None
                }
            });
        let value = explicit.unwrap_or(next);
        next = value.wrapping_add(1);
        scope.insert(constant.name.clone(), value);

        constants.push(EnumConstant {
            name: constant.name.clone(),
            explicit,
            value,
            comment: constant.comment.clone(),
            annotations: constant.annotations.clone(),
        });
    }

    EnumDecl {
        name: cursor.name.clone(),
        comment: cursor.comment.clone(),
        annotations: cursor.annotations.clone(),
        constants,
    }
}

fn function_decl(cursor: &Cursor) -> FunctionDecl {
    FunctionDecl {
        name: cursor.name.clone(),
        comment: cursor.comment.clone(),
        annotations: cursor.annotations.clone(),
        return_type: cursor.type_spelling.clone(),
        parameters: cursor
            .children_of(CursorKind::ParmDecl)
            .map(|param| Parameter {
                name: param.name.clone(),
                type_spelling: param.type_spelling.clone(),
            })
            .collect(),
        is_variadic: cursor.is_variadic,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn values(e: &EnumDecl) -> Vec<(&str, i64)> {
        e.constants.iter().map(|c| (c.name.as_str(), c.value)).collect()
    }

    #[test]
    fn classify_in_source_order() {
        let entities = Entities::from_source(
            r#"
struct A { int x; };
typedef int T1;
void f(void);
struct B { int y; };
enum E { X };
typedef float T2;
int variable;
union U { int i; };
"#,
        )
        .unwrap();

        let structs: Vec<&str> = entities.structs.iter().map(|s| s.name.as_str()).collect();
        let typedefs: Vec<&str> = entities.typedefs.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(structs, vec!["A", "B"]);
        assert_eq!(typedefs, vec!["T1", "T2"]);
        assert_eq!(entities.enums.len(), 1);
        assert_eq!(entities.functions.len(), 1);
        assert_eq!(entities.len(), 6);
    }

    #[test]
    fn implicit_enum_values_count_from_zero() {
        let entities =
            Entities::from_source(r#"enum __attribute__((annotate("binding"))) Color { RED, BLUE, GREEN };"#)
                .unwrap();
        assert_eq!(
            values(&entities.enums[0]),
            vec![("RED", 0), ("BLUE", 1), ("GREEN", 2)]
        );
        assert!(entities.enums[0].constants.iter().all(|c| c.explicit.is_none()));
    }

    #[test]
    fn explicit_values_reset_the_baseline() {
        let entities = Entities::from_source("enum E { A, B = 10, C, D = -3, E2, F = B + 5 };").unwrap();
        assert_eq!(
            values(&entities.enums[0]),
            vec![("A", 0), ("B", 10), ("C", 11), ("D", -3), ("E2", -2), ("F", 15)]
        );
        assert_eq!(entities.enums[0].constants[1].explicit, Some(10));
        assert_eq!(entities.enums[0].constants[2].explicit, None);
    }

    #[test]
    fn constants_resolve_across_enums() {
        let entities =
            Entities::from_source("enum A { FIRST = 4 };\nenum B { SECOND = FIRST * 2, THIRD };").unwrap();
        assert_eq!(values(&entities.enums[1]), vec![("SECOND", 8), ("THIRD", 9)]);
    }

    #[test]
    fn unevaluable_initializer_counts_as_implicit() {
        let entities = Entities::from_source("enum E { A = 5, B = sizeof(int), C };").unwrap();
        assert_eq!(values(&entities.enums[0]), vec![("A", 5), ("B", 6), ("C", 7)]);
        assert_eq!(entities.enums[0].constants[1].explicit, None);
    }

    #[test]
    fn hidden_constants_still_take_a_value() {
        let entities = Entities::from_source(
            r#"enum E { A, B __attribute__((annotate("hidden"))), C };"#,
        )
        .unwrap();
        assert_eq!(values(&entities.enums[0]), vec![("A", 0), ("B", 1), ("C", 2)]);
    }

    #[test]
    fn function_shape() {
        let entities =
            Entities::from_source("/// Adds.\nint add(int a, int b);\nint log_line(const char *fmt, ...);")
                .unwrap();
        let add = &entities.functions[0];
        assert_eq!(add.return_type, "int");
        assert_eq!(add.comment.as_deref(), Some("/// Adds."));
        let params: Vec<(&str, &str)> = add
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p.type_spelling.as_str()))
            .collect();
        assert_eq!(params, vec![("a", "int"), ("b", "int")]);
        assert!(entities.functions[1].is_variadic);
    }

    #[test]
    fn forward_declarations_are_not_structs() {
        let entities = Entities::from_source("struct Opaque;\ntypedef struct Opaque Opaque;").unwrap();
        assert!(entities.structs.is_empty());
        assert_eq!(entities.typedefs[0].underlying, "struct Opaque");
    }

    #[test]
    fn crlf_header_with_continued_macro() {
        let source = "#define SWAP(a, b) \\\r\n    do { int t = a; a = b; b = t; } while (0)\r\nint __attribute__((annotate(\"binding\"))) answer(void);\r\n";
        let entities = Entities::from_source(source).unwrap();
        let names: Vec<&str> = entities.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["answer"]);
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn parse_errors_propagate() {
        assert!(Entities::from_source("struct S { int x;").is_err());
    }
}
