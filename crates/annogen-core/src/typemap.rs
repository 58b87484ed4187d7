//! C type spelling to target type mapping.

use std::fmt;

use serde::Serialize;

use crate::filter::CustomTypes;

/// The semantic bucket a C type falls into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TargetType {
    Integer,
    FloatingPoint,
    NoValue,
    Text,
    /// A bound struct, enum or typedef, by name.
    Custom(String),
    /// Anything else.
    Dynamic,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetType::Integer => write!(f, "int"),
            TargetType::FloatingPoint => write!(f, "float"),
            TargetType::NoValue => write!(f, "None"),
            TargetType::Text => write!(f, "str"),
            TargetType::Custom(name) => write!(f, "{name}"),
            TargetType::Dynamic => write!(f, "Any"),
        }
    }
}

const INTEGER_TYPES: &[&str] = &[
    "char",
    "signed char",
    "unsigned char",
    "short",
    "short int",
    "signed short",
    "unsigned short",
    "unsigned short int",
    "int",
    "signed",
    "signed int",
    "unsigned",
    "unsigned int",
    "long",
    "long int",
    "signed long",
    "unsigned long",
    "unsigned long int",
    "long long",
    "long long int",
    "unsigned long long",
    "unsigned long long int",
    "_Bool",
    "bool",
    "int8_t",
    "int16_t",
    "int32_t",
    "int64_t",
    "uint8_t",
    "uint16_t",
    "uint32_t",
    "uint64_t",
    "size_t",
    "ssize_t",
    "ptrdiff_t",
    "intptr_t",
    "uintptr_t",
];

const FLOATING_TYPES: &[&str] = &["float", "double", "long double"];

const TEXT_TYPES: &[&str] = &["const char *", "char *"];

/// Strip a leading `enum `/`struct ` keyword, a `const` qualifier on
/// non-pointer types, and a `const` on the outermost pointer.
pub fn normalize(spelling: &str) -> &str {
    let mut s = spelling.trim();
    if !s.contains('*') {
        s = s.strip_prefix("const ").unwrap_or(s).trim_start();
    } else if let Some(pointer) = s.strip_suffix("const") {
        if pointer.trim_end().ends_with('*') {
            s = pointer.trim_end();
        }
    }
    for keyword in ["enum ", "struct "] {
        if let Some(rest) = s.strip_prefix(keyword) {
            return rest.trim();
        }
    }
    s
}

/// Map a C type spelling, consulting the custom-type universe for
/// anything outside the fixed table.
///
/// Unknown spellings map to [`TargetType::Dynamic`] with a warning.
pub fn map_type(spelling: &str, custom: &CustomTypes) -> TargetType {
    let normalized = normalize(spelling);
    if INTEGER_TYPES.contains(&normalized) {
        TargetType::Integer
    } else if FLOATING_TYPES.contains(&normalized) {
        TargetType::FloatingPoint
    } else if normalized == "void" {
        TargetType::NoValue
    } else if TEXT_TYPES.contains(&normalized) {
        TargetType::Text
    } else if custom.contains(normalized) {
        TargetType::Custom(normalized.to_string())
    } else {
        log::warn!(
            "unknown C type '{spelling}', using {}",
            TargetType::Dynamic
        );
        TargetType::Dynamic
    }
}
