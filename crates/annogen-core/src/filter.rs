//! Annotation filtering.
//!
//! A top-level declaration is exposed only when tagged `binding`; a
//! struct field or enum constant tagged `hidden` is dropped while its
//! parent stays. Function parameters are never filtered individually.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::entity::Annotated;
use crate::extract::Entities;

/// Names of the bound struct, enum and typedef declarations.
///
/// Passed explicitly to the type mapper; there is no process-wide
/// "current" universe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CustomTypes(BTreeSet<String>);

impl CustomTypes {
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for CustomTypes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        CustomTypes(iter.into_iter().map(Into::into).collect())
    }
}

/// The custom-type universe of `entities`.
pub fn custom_type_universe(entities: &Entities) -> CustomTypes {
    let structs = entities
        .structs
        .iter()
        .filter(|s| s.is_bound())
        .map(|s| s.name.clone());
    let enums = entities
        .enums
        .iter()
        .filter(|e| e.is_bound())
        .map(|e| e.name.clone());
    let typedefs = entities
        .typedefs
        .iter()
        .filter(|t| t.is_bound())
        .map(|t| t.name.clone());
    structs.chain(enums).chain(typedefs).collect()
}

/// The exposed view of `entities`: bound declarations only, with hidden
/// members removed. Source order is preserved.
pub fn bound(entities: &Entities) -> Entities {
    Entities {
        structs: entities
            .structs
            .iter()
            .filter(|s| s.is_bound())
            .cloned()
            .map(|mut s| {
                s.fields.retain(|f| !f.is_hidden());
                s
            })
            .collect(),
        enums: entities
            .enums
            .iter()
            .filter(|e| e.is_bound())
            .cloned()
            .map(|mut e| {
                e.constants.retain(|c| !c.is_hidden());
                e
            })
            .collect(),
        typedefs: entities
            .typedefs
            .iter()
            .filter(|t| t.is_bound())
            .cloned()
            .collect(),
        functions: entities
            .functions
            .iter()
            .filter(|f| f.is_bound())
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const HEADER: &str = r#"
struct __attribute__((annotate("binding"))) Point {
    int x;
    int y __attribute__((annotate("hidden")));
    int z;
};
struct Internal { int secret; };
enum __attribute__((annotate("binding"))) Mode {
    MODE_A,
    MODE_DEBUG __attribute__((annotate("hidden"))),
    MODE_B
};
typedef __attribute__((annotate("binding"))) unsigned int EntityId;
typedef int Handle;
void __attribute__((annotate("binding"))) spawn(struct Point at, EntityId id);
void not_bound(int a);
"#;

    #[test]
    fn hidden_field_is_dropped() {
        let entities = Entities::from_source(HEADER).unwrap();
        let exposed = bound(&entities);
        assert_eq!(exposed.structs.len(), 1);
        let fields: Vec<&str> = exposed.structs[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["x", "z"]);
    }

    #[test]
    fn hidden_constant_is_dropped_and_values_kept() {
        let entities = Entities::from_source(HEADER).unwrap();
        let exposed = bound(&entities);
        let constants: Vec<(&str, i64)> = exposed.enums[0]
            .constants
            .iter()
            .map(|c| (c.name.as_str(), c.value))
            .collect();
        assert_eq!(constants, vec![("MODE_A", 0), ("MODE_B", 2)]);
    }

    #[test]
    fn unbound_function_is_extracted_but_not_exposed() {
        let entities = Entities::from_source(HEADER).unwrap();
        assert!(entities.functions.iter().any(|f| f.name == "not_bound"));

        let exposed = bound(&entities);
        let names: Vec<&str> = exposed.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["spawn"]);
        assert_eq!(exposed.functions[0].parameters.len(), 2);
    }

    #[test]
    fn universe_holds_bound_type_names() {
        let entities = Entities::from_source(HEADER).unwrap();
        let universe = custom_type_universe(&entities);
        let names: Vec<&str> = universe.iter().collect();
        assert_eq!(names, vec!["EntityId", "Mode", "Point"]);
        assert!(!universe.contains("Internal"));
        assert!(!universe.contains("Handle"));
        assert!(!universe.contains("spawn"));
    }

    #[test]
    fn empty_bound_struct_survives() {
        let entities = Entities::from_source(
            r#"struct __attribute__((annotate("binding"))) Empty { int only __attribute__((annotate("hidden"))); };"#,
        )
        .unwrap();
        let exposed = bound(&entities);
        assert_eq!(exposed.structs.len(), 1);
        assert!(exposed.structs[0].fields.is_empty());
    }

    #[test]
    fn enum_with_only_hidden_constants_survives() {
        let entities = Entities::from_source(
            r#"enum __attribute__((annotate("binding"))) Reserved {
    SLOT_A __attribute__((annotate("hidden"))),
    SLOT_B __attribute__((annotate("hidden"))) = 4,
};"#,
        )
        .unwrap();
        let exposed = bound(&entities);
        assert_eq!(exposed.enums.len(), 1);
        assert_eq!(exposed.enums[0].name, "Reserved");
        assert!(exposed.enums[0].constants.is_empty());
        assert!(custom_type_universe(&entities).contains("Reserved"));
    }
}
