//! Canonical spelling of C builtin type specifiers.
//!
//! C lets the same builtin be written many ways (`unsigned`, `unsigned int`,
//! `int unsigned`, `long int`, ...). Consumers match on spellings, so every
//! specifier combination is folded to the single form clang prints.

use std::fmt;

/// A C builtin arithmetic or void type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Void,
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Float,
    Double,
    LongDouble,
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Builtin::Void => write!(f, "void"),
            Builtin::Bool => write!(f, "_Bool"),
            Builtin::Char => write!(f, "char"),
            Builtin::SignedChar => write!(f, "signed char"),
            Builtin::UnsignedChar => write!(f, "unsigned char"),
            Builtin::Short => write!(f, "short"),
            Builtin::UnsignedShort => write!(f, "unsigned short"),
            Builtin::Int => write!(f, "int"),
            Builtin::UnsignedInt => write!(f, "unsigned int"),
            Builtin::Long => write!(f, "long"),
            Builtin::UnsignedLong => write!(f, "unsigned long"),
            Builtin::LongLong => write!(f, "long long"),
            Builtin::UnsignedLongLong => write!(f, "unsigned long long"),
            Builtin::Float => write!(f, "float"),
            Builtin::Double => write!(f, "double"),
            Builtin::LongDouble => write!(f, "long double"),
        }
    }
}

/// Whether `word` is a keyword that can make up a builtin type.
pub fn is_builtin_keyword(word: &str) -> bool {
    matches!(
        word,
        "void"
            | "char"
            | "short"
            | "int"
            | "long"
            | "float"
            | "double"
            | "signed"
            | "unsigned"
            | "_Bool"
            | "bool"
            | "__signed"
            | "__signed__"
    )
}

impl Builtin {
    /// Fold a set of builtin keywords, in any order, into one builtin.
    ///
    /// Returns `None` when the words are not a valid combination.
    pub fn from_keywords<S: AsRef<str>>(words: &[S]) -> Option<Builtin> {
        let mut unsigned = false;
        let mut signed = false;
        let mut shorts = 0;
        let mut longs = 0;
        let mut base: Option<&str> = None;

        for word in words {
            match word.as_ref() {
                "unsigned" => unsigned = true,
                "signed" | "__signed" | "__signed__" => signed = true,
                "short" => shorts += 1,
                "long" => longs += 1,
                "int" => {}
                other @ ("void" | "char" | "float" | "double" | "_Bool" | "bool") => {
                    if base.is_some() {
                        return None;
                    }
                    base = Some(other);
                }
                _ => return None,
            }
        }

        if unsigned && signed {
            return None;
        }

        let builtin = match base {
            Some("void") => Builtin::Void,
            Some("_Bool") | Some("bool") => Builtin::Bool,
            Some("float") => Builtin::Float,
            Some("double") if longs > 0 => Builtin::LongDouble,
            Some("double") => Builtin::Double,
            Some("char") if unsigned => Builtin::UnsignedChar,
            Some("char") if signed => Builtin::SignedChar,
            Some("char") => Builtin::Char,
            Some(_) => return None,
            None if shorts > 0 && unsigned => Builtin::UnsignedShort,
            None if shorts > 0 => Builtin::Short,
            None if longs >= 2 && unsigned => Builtin::UnsignedLongLong,
            None if longs >= 2 => Builtin::LongLong,
            None if longs == 1 && unsigned => Builtin::UnsignedLong,
            None if longs == 1 => Builtin::Long,
            None if unsigned => Builtin::UnsignedInt,
            None => Builtin::Int,
        };
        Some(builtin)
    }
}

/// Spell a base type: qualifiers first, then the canonical type name.
pub fn spell_base(is_const: bool, is_volatile: bool, name: &str) -> String {
    let mut out = String::new();
    if is_const {
        out.push_str("const ");
    }
    if is_volatile {
        out.push_str("volatile ");
    }
    out.push_str(name);
    out
}

/// Append one pointer level (optionally `const`) to a spelling.
pub fn push_pointer(spelling: &mut String, is_const: bool) {
    if spelling.ends_with('*') {
        spelling.push('*');
    } else {
        spelling.push_str(" *");
    }
    if is_const {
        spelling.push_str("const");
    }
}
