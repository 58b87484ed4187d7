//! Declaration parser.
//!
//! Walks the token stream once and emits one [`Cursor`] per top-level
//! declaration. Nested tag definitions are parsed (their members must be
//! skipped correctly) but only surface through the type spelling of the
//! field that uses them. A declaration that cannot be understood is
//! skipped with a warning; only lexical errors and unbalanced brackets
//! abort the parse.

use std::collections::HashSet;

use crate::cursor::{Cursor, CursorKind};
use crate::error::{ParseError, Result};
use crate::lexer::{Comment, Lexed, Token, TokenKind};
use crate::types::{is_builtin_keyword, push_pointer, spell_base, Builtin};

/// Storage-class and function specifiers that do not affect the type.
const IGNORED_SPECIFIERS: &[&str] = &[
    "extern",
    "static",
    "inline",
    "__inline",
    "__inline__",
    "_Noreturn",
    "register",
    "auto",
    "_Thread_local",
    "thread_local",
    "__thread",
    "__extension__",
    "_Complex",
    "__restrict",
    "restrict",
    "_Atomic",
];

/// Qualifiers that may follow a `*` without changing the spelling.
const POINTER_QUALIFIERS: &[&str] = &[
    "volatile",
    "__volatile__",
    "restrict",
    "__restrict",
    "__restrict__",
    "_Nonnull",
    "_Nullable",
    "_Null_unspecified",
    "__unaligned",
];

const ATTRIBUTE_KEYWORDS: &[&str] = &[
    "__attribute__",
    "__attribute",
    "__declspec",
    "__asm__",
    "__asm",
    "asm",
];

const RESERVED: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while", "_Bool", "_Complex", "_Noreturn",
    "_Static_assert", "_Thread_local",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Struct,
    Union,
    Enum,
}

impl TagKind {
    fn keyword(self) -> &'static str {
        match self {
            TagKind::Struct => "struct",
            TagKind::Union => "union",
            TagKind::Enum => "enum",
        }
    }

    fn cursor_kind(self) -> CursorKind {
        match self {
            TagKind::Struct => CursorKind::StructDecl,
            TagKind::Union => CursorKind::UnionDecl,
            TagKind::Enum => CursorKind::EnumDecl,
        }
    }
}

/// A `struct`/`union`/`enum` specifier, with its members when defined.
#[derive(Debug)]
struct TagSpec {
    kind: TagKind,
    name: Option<String>,
    annotations: Vec<String>,
    body: Option<Vec<Cursor>>,
    line: u32,
}

impl TagSpec {
    fn spelling(&self) -> String {
        format!(
            "{} {}",
            self.kind.keyword(),
            self.name.as_deref().unwrap_or("(anonymous)")
        )
    }

    fn to_cursor(&self) -> Cursor {
        let mut cursor = Cursor::new(
            self.kind.cursor_kind(),
            self.name.clone().unwrap_or_default(),
            self.line,
        );
        cursor.type_spelling = self.spelling();
        cursor.annotations = self.annotations.clone();
        cursor.children = self.body.clone().unwrap_or_default();
        cursor.is_definition = self.body.is_some();
        cursor
    }
}

/// Declaration specifiers: everything before the first declarator.
#[derive(Debug, Default)]
struct Specifiers {
    is_typedef: bool,
    is_const: bool,
    is_volatile: bool,
    keywords: Vec<String>,
    type_name: Option<String>,
    tag: Option<TagSpec>,
    annotations: Vec<String>,
}

impl Specifiers {
    fn has_type(&self) -> bool {
        !self.keywords.is_empty() || self.type_name.is_some() || self.tag.is_some()
    }

    fn base_spelling(&self) -> String {
        let name = if let Some(tag) = &self.tag {
            tag.spelling()
        } else if let Some(name) = &self.type_name {
            name.clone()
        } else {
            Builtin::from_keywords(&self.keywords)
                .map(|b| b.to_string())
                .unwrap_or_else(|| self.keywords.join(" "))
        };
        spell_base(self.is_const, self.is_volatile, &name)
    }
}

#[derive(Debug, Clone, Default)]
struct ParamList {
    params: Vec<Cursor>,
    is_variadic: bool,
    explicit_void: bool,
}

impl ParamList {
    fn spelling(&self) -> String {
        let mut parts: Vec<String> = self
            .params
            .iter()
            .map(|p| p.type_spelling.clone())
            .collect();
        if self.is_variadic {
            parts.push("...".to_string());
        }
        if parts.is_empty() && self.explicit_void {
            return "void".to_string();
        }
        parts.join(", ")
    }
}

#[derive(Debug)]
enum Suffix {
    Array(String),
    Function(ParamList),
}

#[derive(Debug, Default)]
struct Declarator {
    name: Option<String>,
    line: u32,
    /// One entry per `*`, `true` when that level is `const`.
    pointers: Vec<bool>,
    /// Parenthesized inner declarator, as in `(*callback)`.
    inner: Option<Box<Declarator>>,
    suffixes: Vec<Suffix>,
    annotations: Vec<String>,
}

impl Declarator {
    fn name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or_else(|| self.inner.as_ref().and_then(|inner| inner.name()))
    }

    fn line(&self) -> u32 {
        match &self.inner {
            Some(inner) if self.name.is_none() => inner.line(),
            _ => self.line,
        }
    }

    fn all_annotations(&self) -> Vec<String> {
        let mut out = self.annotations.clone();
        if let Some(inner) = &self.inner {
            out.extend(inner.all_annotations());
        }
        out
    }
}

fn append_suffixes(spelling: &mut String, suffixes: &[Suffix]) {
    for suffix in suffixes {
        match suffix {
            Suffix::Array(dim) => {
                spelling.push('[');
                spelling.push_str(dim);
                spelling.push(']');
            }
            Suffix::Function(params) => {
                if !spelling.ends_with(')') {
                    spelling.push(' ');
                }
                spelling.push('(');
                spelling.push_str(&params.spelling());
                spelling.push(')');
            }
        }
    }
}

fn pointer_core(pointers: &[bool]) -> String {
    let mut core = String::new();
    for &is_const in pointers {
        core.push('*');
        if is_const {
            core.push_str("const");
        }
    }
    core
}

/// The full type a declarator gives to `base`.
fn spell(base: &str, declarator: &Declarator) -> String {
    let mut spelling = base.to_string();
    for &is_const in &declarator.pointers {
        push_pointer(&mut spelling, is_const);
    }
    if let Some(inner) = &declarator.inner {
        let mut core = pointer_core(&inner.pointers);
        append_suffixes(&mut core, &inner.suffixes);
        spelling = format!("{spelling} ({core})");
    }
    append_suffixes(&mut spelling, &declarator.suffixes);
    spelling
}

/// Return type and parameters when the declarator declares a function.
fn function_signature<'d>(base: &str, declarator: &'d Declarator) -> Option<(String, &'d ParamList)> {
    match &declarator.inner {
        None => match declarator.suffixes.first() {
            Some(Suffix::Function(params)) => {
                let mut ret = base.to_string();
                for &is_const in &declarator.pointers {
                    push_pointer(&mut ret, is_const);
                }
                Some((ret, params))
            }
            _ => None,
        },
        // `int (*handler(void))(int)`: a function returning a function pointer.
        Some(inner) if inner.inner.is_none() => match inner.suffixes.first() {
            Some(Suffix::Function(params)) if inner.name.is_some() => {
                let mut ret = base.to_string();
                for &is_const in &declarator.pointers {
                    push_pointer(&mut ret, is_const);
                }
                ret = format!("{ret} ({})", pointer_core(&inner.pointers));
                append_suffixes(&mut ret, &declarator.suffixes);
                Some((ret, params))
            }
            _ => None,
        },
        Some(_) => None,
    }
}

fn join_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collect `annotate("...")` arguments from an attribute token group.
fn scan_annotations(tokens: &[Token], out: &mut Vec<String>) {
    for window in tokens.windows(3) {
        let is_annotate = window[0].is_ident("annotate") || window[0].is_ident("__annotate__");
        if is_annotate && window[1].is_punct("(") {
            if let TokenKind::Str(tag) = &window[2].kind {
                out.push(tag.clone());
            }
        }
    }
}

fn is_attribute_keyword(token: &Token) -> bool {
    token
        .ident()
        .is_some_and(|word| ATTRIBUTE_KEYWORDS.contains(&word))
}

/// Declaration parser over a lexed header.
pub struct Parser<'a> {
    tokens: &'a [Token],
    comments: &'a [Comment],
    pos: usize,
    consumed: HashSet<usize>,
}

impl<'a> Parser<'a> {
    pub fn new(lexed: &'a Lexed) -> Self {
        Self {
            tokens: &lexed.tokens,
            comments: &lexed.comments,
            pos: 0,
            consumed: HashSet::new(),
        }
    }

    /// Parse every top-level declaration.
    pub fn parse(mut self) -> Result<Vec<Cursor>> {
        self.check_balance()?;

        let mut cursors = Vec::new();
        while let Some(token) = self.peek() {
            if token.is_punct(";") || token.is_punct("}") {
                self.pos += 1;
                continue;
            }
            // extern "C" { ... } is transparent; its closing brace is skipped above.
            if token.is_ident("extern")
                && matches!(self.peek_at(1).map(|t| &t.kind), Some(TokenKind::Str(_)))
            {
                self.pos += 2;
                self.eat_punct("{");
                continue;
            }
            if token.is_ident("_Static_assert") || token.is_ident("static_assert") {
                self.skip_declaration();
                continue;
            }

            let start = self.pos;
            match self.declaration() {
                Ok(found) => cursors.extend(found),
                Err(ParseError::Syntax { line, detail }) => {
                    log::warn!("skipping declaration at line {line}: {detail}");
                    self.pos = start;
                    self.skip_declaration();
                }
                Err(e) => return Err(e),
            }
        }

        Ok(cursors)
    }

    fn declaration(&mut self) -> Result<Vec<Cursor>> {
        let start = self.pos;
        let comment = self.leading_comment(start);
        let mut specs = self.specifiers()?;
        if !specs.has_type() {
            return Err(self.syntax("expected a declaration"));
        }

        let mut declarators = Vec::new();
        let mut has_body = false;
        if !self.at_punct(";") {
            loop {
                let declarator = self.declarator()?;
                if self.at_punct("{") && function_signature("", &declarator).is_some() {
                    self.balanced_group()?;
                    declarators.push(declarator);
                    has_body = true;
                    break;
                }
                if self.eat_punct("=") {
                    self.collect_until(&[",", ";"]);
                }
                declarators.push(declarator);
                if !self.eat_punct(",") {
                    break;
                }
            }
        }
        if !has_body {
            self.expect_punct(";")?;
        }

        // An anonymous tag defined inside a typedef takes the typedef's name.
        if specs.is_typedef {
            let first_name = declarators.first().and_then(|d| d.name()).map(String::from);
            if let Some(tag) = specs.tag.as_mut() {
                if tag.name.is_none() && tag.body.is_some() {
                    tag.name = first_name;
                }
            }
        }

        let mut out = Vec::new();
        if let Some(tag) = &specs.tag {
            if tag.body.is_some() || declarators.is_empty() {
                let mut cursor = tag.to_cursor();
                if !specs.is_typedef && declarators.is_empty() {
                    cursor.annotations.extend(specs.annotations.iter().cloned());
                }
                cursor.comment = comment.clone();
                out.push(cursor);
            }
        }

        let base = specs.base_spelling();
        for declarator in &declarators {
            let Some(name) = declarator.name() else {
                return Err(self.syntax("declarator without a name"));
            };
            let mut cursor = if specs.is_typedef {
                let mut cursor = Cursor::new(CursorKind::TypedefDecl, name, declarator.line());
                cursor.type_spelling = spell(&base, declarator);
                cursor
            } else if let Some((ret, params)) = function_signature(&base, declarator) {
                let mut cursor = Cursor::new(CursorKind::FunctionDecl, name, declarator.line());
                cursor.type_spelling = ret;
                cursor.children = params.params.clone();
                cursor.is_variadic = params.is_variadic;
                cursor.is_definition = has_body;
                cursor
            } else {
                let mut cursor = Cursor::new(CursorKind::VarDecl, name, declarator.line());
                cursor.type_spelling = spell(&base, declarator);
                cursor
            };
            cursor.annotations = specs.annotations.clone();
            cursor.annotations.extend(declarator.all_annotations());
            cursor.comment = comment.clone();
            out.push(cursor);
        }

        Ok(out)
    }

    fn specifiers(&mut self) -> Result<Specifiers> {
        let mut specs = Specifiers::default();
        while let Some(token) = self.peek() {
            let Some(word) = token.ident() else {
                if self.at_double_bracket() {
                    self.bracket_attribute(&mut specs.annotations)?;
                    continue;
                }
                break;
            };
            match word {
                "typedef" => {
                    specs.is_typedef = true;
                    self.pos += 1;
                }
                "const" | "__const" => {
                    specs.is_const = true;
                    self.pos += 1;
                }
                "volatile" | "__volatile__" => {
                    specs.is_volatile = true;
                    self.pos += 1;
                }
                w if IGNORED_SPECIFIERS.contains(&w) => self.pos += 1,
                w if ATTRIBUTE_KEYWORDS.contains(&w) => self.attribute(&mut specs.annotations)?,
                "struct" | "union" | "enum" => {
                    if specs.has_type() {
                        break;
                    }
                    specs.tag = Some(self.tag()?);
                }
                w if is_builtin_keyword(w) => {
                    if specs.tag.is_some() {
                        break;
                    }
                    // A name before a builtin keyword is an unexpanded macro.
                    if let Some(skipped) = specs.type_name.take() {
                        log::debug!("ignoring unknown specifier '{skipped}'");
                    }
                    specs.keywords.push(w.to_string());
                    self.pos += 1;
                }
                _ => {
                    if specs.has_type() || RESERVED.contains(&word) {
                        break;
                    }
                    specs.type_name = Some(word.to_string());
                    self.pos += 1;
                }
            }
        }
        Ok(specs)
    }

    fn tag(&mut self) -> Result<TagSpec> {
        let keyword = self.next_token()?;
        let kind = match keyword.ident() {
            Some("struct") => TagKind::Struct,
            Some("union") => TagKind::Union,
            _ => TagKind::Enum,
        };

        // Attributes between the keyword and the name belong to the tag;
        // anything after the name belongs to the enclosing declaration.
        let mut annotations = Vec::new();
        let mut name = None;
        while let Some(token) = self.peek() {
            if is_attribute_keyword(token) {
                self.attribute(&mut annotations)?;
            } else if self.at_double_bracket() {
                self.bracket_attribute(&mut annotations)?;
            } else if let Some(word) = token.ident().filter(|w| !RESERVED.contains(w)) {
                name = Some(word.to_string());
                self.pos += 1;
                break;
            } else {
                break;
            }
        }

        // C23 fixed underlying type: `enum Color : uint8_t { ... }`.
        if kind == TagKind::Enum && self.eat_punct(":") {
            self.collect_until(&["{", ";"]);
        }

        let body = if self.at_punct("{") {
            Some(match kind {
                TagKind::Enum => self.enum_body()?,
                TagKind::Struct | TagKind::Union => self.record_body()?,
            })
        } else {
            None
        };

        if name.is_none() && body.is_none() {
            return Err(self.syntax(&format!("expected a name or body after '{}'", kind.keyword())));
        }

        Ok(TagSpec {
            kind,
            name,
            annotations,
            body,
            line: keyword.line,
        })
    }

    fn record_body(&mut self) -> Result<Vec<Cursor>> {
        self.expect_punct("{")?;
        let mut fields = Vec::new();

        while !self.at_punct("}") {
            if self.eat_punct(";") {
                continue;
            }
            let comment = self.leading_comment(self.pos);
            let specs = self.specifiers()?;
            if !specs.has_type() {
                return Err(self.syntax("expected a field declaration"));
            }
            let base = specs.base_spelling();

            let mut group = Vec::new();
            if !self.at_punct(";") {
                loop {
                    let declarator = self.declarator()?;
                    if self.eat_punct(":") {
                        self.collect_until(&[",", ";"]);
                    }
                    if let Some(name) = declarator.name() {
                        let mut field = Cursor::new(CursorKind::FieldDecl, name, declarator.line());
                        field.type_spelling = spell(&base, &declarator);
                        field.annotations = specs.annotations.clone();
                        field.annotations.extend(declarator.all_annotations());
                        group.push(field);
                    }
                    if !self.eat_punct(",") {
                        break;
                    }
                }
            }
            self.expect_punct(";")?;

            let comment = comment.or_else(|| self.trailing_comment());
            for field in &mut group {
                field.comment = comment.clone();
            }
            fields.extend(group);
        }

        self.expect_punct("}")?;
        Ok(fields)
    }

    fn enum_body(&mut self) -> Result<Vec<Cursor>> {
        self.expect_punct("{")?;
        let mut constants = Vec::new();

        while !self.at_punct("}") {
            let comment = self.leading_comment(self.pos);
            let token = self.next_token()?;
            let Some(name) = token.ident() else {
                return Err(ParseError::Syntax {
                    line: token.line,
                    detail: format!("expected an enumerator name, found '{token}'"),
                });
            };

            let mut constant = Cursor::new(CursorKind::EnumConstantDecl, name, token.line);
            constant.type_spelling = "int".to_string();
            while let Some(next) = self.peek() {
                if is_attribute_keyword(next) {
                    self.attribute(&mut constant.annotations)?;
                } else if self.at_double_bracket() {
                    self.bracket_attribute(&mut constant.annotations)?;
                } else {
                    break;
                }
            }
            if self.eat_punct("=") {
                let expr = self.collect_until(&[",", "}"]);
                if expr.is_empty() {
                    return Err(self.syntax(&format!("missing value for enumerator '{name}'")));
                }
                constant.initializer = Some(expr);
            }
            if !self.eat_punct(",") && !self.at_punct("}") {
                return Err(self.syntax(&format!("expected ',' or '}}' after enumerator '{name}'")));
            }
            constant.comment = comment.or_else(|| self.trailing_comment());
            constants.push(constant);
        }

        self.expect_punct("}")?;
        Ok(constants)
    }

    fn declarator(&mut self) -> Result<Declarator> {
        let mut declarator = Declarator {
            line: self.current_line(),
            ..Default::default()
        };

        while let Some(token) = self.peek() {
            if token.is_punct("*") {
                declarator.pointers.push(false);
                self.pos += 1;
            } else if token.is_ident("const") || token.is_ident("__const") {
                if let Some(last) = declarator.pointers.last_mut() {
                    *last = true;
                }
                self.pos += 1;
            } else if token.ident().is_some_and(|w| POINTER_QUALIFIERS.contains(&w)) {
                self.pos += 1;
            } else if is_attribute_keyword(token) {
                self.attribute(&mut declarator.annotations)?;
            } else {
                break;
            }
        }

        let parenthesized = self.at_punct("(")
            && self
                .peek_at(1)
                .is_some_and(|t| t.is_punct("*") || t.is_punct("^") || t.is_punct("("));
        if parenthesized {
            self.pos += 1;
            declarator.inner = Some(Box::new(self.declarator()?));
            self.expect_punct(")")?;
        } else if let Some(token) = self.peek() {
            if let Some(name) = token.ident().filter(|w| !RESERVED.contains(w)) {
                declarator.name = Some(name.to_string());
                declarator.line = token.line;
                self.pos += 1;
            }
        }

        loop {
            if self.at_punct("[") {
                let dim = join_tokens(self.balanced_group()?);
                declarator.suffixes.push(Suffix::Array(dim));
            } else if self.at_punct("(") {
                let params = self.parameter_list()?;
                declarator.suffixes.push(Suffix::Function(params));
            } else if self.peek().is_some_and(is_attribute_keyword) {
                self.attribute(&mut declarator.annotations)?;
            } else if self.at_double_bracket() {
                self.bracket_attribute(&mut declarator.annotations)?;
            } else {
                break;
            }
        }

        Ok(declarator)
    }

    fn parameter_list(&mut self) -> Result<ParamList> {
        self.expect_punct("(")?;
        let mut list = ParamList::default();
        if self.eat_punct(")") {
            return Ok(list);
        }
        if self.peek().is_some_and(|t| t.is_ident("void"))
            && self.peek_at(1).is_some_and(|t| t.is_punct(")"))
        {
            self.pos += 2;
            list.explicit_void = true;
            return Ok(list);
        }

        loop {
            if self.eat_punct("...") {
                list.is_variadic = true;
            } else {
                let specs = self.specifiers()?;
                if !specs.has_type() {
                    return Err(self.syntax("expected a parameter type"));
                }
                let declarator = self.declarator()?;
                let mut param = Cursor::new(
                    CursorKind::ParmDecl,
                    declarator.name().unwrap_or_default(),
                    declarator.line(),
                );
                param.type_spelling = spell(&specs.base_spelling(), &declarator);
                param.annotations = specs.annotations;
                param.annotations.extend(declarator.all_annotations());
                list.params.push(param);
            }

            if self.eat_punct(")") {
                break;
            }
            self.expect_punct(",")?;
        }

        Ok(list)
    }

    /// `__attribute__((...))` and friends. Only `annotate` is kept.
    fn attribute(&mut self, annotations: &mut Vec<String>) -> Result<()> {
        self.pos += 1;
        if self.at_punct("(") {
            let group = self.balanced_group()?;
            scan_annotations(group, annotations);
        }
        Ok(())
    }

    /// `[[clang::annotate("...")]]`.
    fn bracket_attribute(&mut self, annotations: &mut Vec<String>) -> Result<()> {
        let group = self.balanced_group()?;
        scan_annotations(group, annotations);
        Ok(())
    }

    fn at_double_bracket(&self) -> bool {
        self.at_punct("[") && self.peek_at(1).is_some_and(|t| t.is_punct("["))
    }

    /// The comment block directly above the token at `start`.
    ///
    /// Comments are merged while they sit on consecutive lines; a blank
    /// line, or any token, ends the block.
    fn leading_comment(&mut self, start: usize) -> Option<String> {
        let line = self.tokens.get(start)?.line;
        let candidates: Vec<usize> = self
            .comments
            .iter()
            .enumerate()
            .filter(|(i, c)| c.before_token == start && !c.trailing && !self.consumed.contains(i))
            .map(|(i, _)| i)
            .collect();

        let mut block = Vec::new();
        let mut next_line = line;
        for &i in candidates.iter().rev() {
            let comment = &self.comments[i];
            if comment.end_line + 1 < next_line {
                break;
            }
            block.push(i);
            next_line = comment.start_line;
        }
        if block.is_empty() {
            return None;
        }
        block.reverse();

        let text = block
            .iter()
            .map(|&i| self.comments[i].text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.consumed.extend(block);
        Some(text)
    }

    /// A `///<`-style comment on the same line as the previous token.
    fn trailing_comment(&mut self) -> Option<String> {
        let prev_line = self.tokens.get(self.pos.checked_sub(1)?)?.line;
        let index = self.comments.iter().enumerate().position(|(i, c)| {
            c.before_token == self.pos
                && c.trailing
                && c.start_line == prev_line
                && !self.consumed.contains(&i)
        })?;
        self.consumed.insert(index);
        Some(self.comments[index].text.clone())
    }

    /// Consume tokens up to (not including) one of `stops` at nesting depth 0.
    fn collect_until(&mut self, stops: &[&str]) -> String {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            if depth == 0 && stops.iter().any(|s| token.is_punct(s)) {
                break;
            }
            if token.is_punct("(") || token.is_punct("[") || token.is_punct("{") {
                depth += 1;
            } else if token.is_punct(")") || token.is_punct("]") || token.is_punct("}") {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            self.pos += 1;
        }
        join_tokens(&self.tokens[start..self.pos])
    }

    /// Skip past the next `;` at depth 0, stopping early at an unmatched `}`.
    fn skip_declaration(&mut self) {
        let start = self.pos;
        self.collect_until(&[";"]);
        if !self.eat_punct(";") && self.pos == start {
            self.pos += 1;
        }
    }

    /// Consume a bracketed group and return the tokens inside it.
    fn balanced_group(&mut self) -> Result<&'a [Token]> {
        let open = self.next_token()?;
        let close = match &open.kind {
            TokenKind::Punct("(") => ")",
            TokenKind::Punct("[") => "]",
            TokenKind::Punct("{") => "}",
            _ => {
                return Err(ParseError::Syntax {
                    line: open.line,
                    detail: format!("expected a bracket, found '{open}'"),
                })
            }
        };
        let tokens = self.tokens;
        let start = self.pos;
        self.collect_until(&[close]);
        let inner = &tokens[start..self.pos];
        self.expect_punct(close)?;
        Ok(inner)
    }

    fn check_balance(&self) -> Result<()> {
        let mut stack: Vec<(char, u32)> = Vec::new();
        for token in self.tokens {
            let TokenKind::Punct(p) = &token.kind else {
                continue;
            };
            match *p {
                "(" => stack.push(('(', token.line)),
                "[" => stack.push(('[', token.line)),
                "{" => stack.push(('{', token.line)),
                ")" | "]" | "}" => {
                    let expected = match *p {
                        ")" => '(',
                        "]" => '[',
                        _ => '{',
                    };
                    match stack.pop() {
                        Some((open, _)) if open == expected => {}
                        Some((open, line)) => {
                            return Err(ParseError::Unbalanced { line, bracket: open })
                        }
                        None => {
                            return Err(ParseError::Unbalanced {
                                line: token.line,
                                bracket: p.chars().next().unwrap_or('?'),
                            })
                        }
                    }
                }
                _ => {}
            }
        }
        match stack.pop() {
            Some((bracket, line)) => Err(ParseError::Unbalanced { line, bracket }),
            None => Ok(()),
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next_token(&mut self) -> Result<&'a Token> {
        let token = self.peek().ok_or_else(|| self.syntax("unexpected end of input"))?;
        self.pos += 1;
        Ok(token)
    }

    fn at_punct(&self, punct: &str) -> bool {
        self.peek().is_some_and(|t| t.is_punct(punct))
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        if self.at_punct(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: &str) -> Result<()> {
        if self.eat_punct(punct) {
            return Ok(());
        }
        let found = self
            .peek()
            .map(|t| format!("'{t}'"))
            .unwrap_or_else(|| "end of input".to_string());
        Err(self.syntax(&format!("expected '{punct}', found {found}")))
    }

    fn current_line(&self) -> u32 {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn syntax(&self, detail: &str) -> ParseError {
        ParseError::Syntax {
            line: self.current_line(),
            detail: detail.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::cursor::{CursorKind, TranslationUnit};

    fn parse(src: &str) -> TranslationUnit {
        TranslationUnit::parse(src).unwrap()
    }

    #[test]
    fn classify_top_level_kinds() {
        let tu = parse(
            r#"
struct Point { int x; int y; };
enum Color { RED, GREEN };
typedef unsigned int u32;
void draw(struct Point p);
int counter;
"#,
        );
        let kinds: Vec<CursorKind> = tu.children().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                CursorKind::StructDecl,
                CursorKind::EnumDecl,
                CursorKind::TypedefDecl,
                CursorKind::FunctionDecl,
                CursorKind::VarDecl,
            ]
        );
    }

    #[test]
    fn struct_fields_and_spellings() {
        let tu = parse("struct S { const char *name; unsigned count; struct S *next; float m[4]; };");
        let s = &tu.cursors[0];
        assert_eq!(s.name, "S");
        assert_eq!(s.type_spelling, "struct S");
        let fields: Vec<(&str, &str)> = s
            .children
            .iter()
            .map(|f| (f.name.as_str(), f.type_spelling.as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("name", "const char *"),
                ("count", "unsigned int"),
                ("next", "struct S *"),
                ("m", "float[4]"),
            ]
        );
    }

    #[test]
    fn annotations_in_every_position() {
        let tu = parse(
            r#"
struct __attribute__((annotate("binding"))) Point {
    int x;
    int y __attribute__((annotate("hidden")));
};
enum __attribute__((annotate("binding"))) Color { RED, HIDDEN __attribute__((annotate("hidden"))) };
void __attribute__((annotate("binding"))) before(int a);
void after(void) __attribute__((annotate("binding")));
typedef __attribute__((annotate("binding"))) const char* cstr_t;
"#,
        );
        let point = &tu.cursors[0];
        assert!(point.has_annotation("binding"));
        assert!(!point.children[0].has_annotation("hidden"));
        assert!(point.children[1].has_annotation("hidden"));

        let color = &tu.cursors[1];
        assert!(color.has_annotation("binding"));
        assert!(color.children[1].has_annotation("hidden"));

        assert!(tu.cursors[2].has_annotation("binding"));
        assert!(tu.cursors[3].has_annotation("binding"));

        let cstr = &tu.cursors[4];
        assert_eq!(cstr.kind, CursorKind::TypedefDecl);
        assert_eq!(cstr.type_spelling, "const char *");
        assert!(cstr.has_annotation("binding"));
    }

    #[test]
    fn attribute_after_tag_name_belongs_to_declaration() {
        let tu = parse(
            r#"
struct Point __attribute__((annotate("binding"))) make_point(void);
struct Size { int w; } __attribute__((annotate("binding")));
"#,
        );
        let make_point = &tu.cursors[0];
        assert_eq!(make_point.kind, CursorKind::FunctionDecl);
        assert_eq!(make_point.type_spelling, "struct Point");
        assert!(make_point.has_annotation("binding"));

        let size = &tu.cursors[1];
        assert_eq!(size.kind, CursorKind::StructDecl);
        assert!(size.has_annotation("binding"));
    }

    #[test]
    fn enum_initializers_kept_as_text() {
        let tu = parse("enum Flags { A = 1 << 0, B = (1 << 1), C, D = A | B };");
        let constants = &tu.cursors[0].children;
        assert_eq!(constants[0].initializer.as_deref(), Some("1 << 0"));
        assert_eq!(constants[1].initializer.as_deref(), Some("( 1 << 1 )"));
        assert_eq!(constants[2].initializer, None);
        assert_eq!(constants[3].initializer.as_deref(), Some("A | B"));
    }

    #[test]
    fn function_parameters() {
        let tu = parse("int printf(const char *fmt, ...);\nfloat mix(float, double b);\nint get(void);");
        let printf = &tu.cursors[0];
        assert_eq!(printf.type_spelling, "int");
        assert!(printf.is_variadic);
        assert_eq!(printf.children.len(), 1);
        assert_eq!(printf.children[0].name, "fmt");

        let mix = &tu.cursors[1];
        assert_eq!(mix.children[0].name, "");
        assert_eq!(mix.children[0].type_spelling, "float");
        assert_eq!(mix.children[1].type_spelling, "double");

        assert!(tu.cursors[2].children.is_empty());
    }

    #[test]
    fn pointer_return_and_function_pointers() {
        let tu = parse(
            "void *alloc(unsigned long size);\ntypedef void (*Callback)(void *data, int code);\nvoid on(Callback cb, int (*filter)(int));",
        );
        assert_eq!(tu.cursors[0].type_spelling, "void *");
        assert_eq!(tu.cursors[1].name, "Callback");
        assert_eq!(tu.cursors[1].type_spelling, "void (*)(void *, int)");
        let on = &tu.cursors[2];
        assert_eq!(on.children[0].type_spelling, "Callback");
        assert_eq!(on.children[1].name, "filter");
        assert_eq!(on.children[1].type_spelling, "int (*)(int)");
    }

    #[test]
    fn typedef_of_anonymous_struct_names_the_struct() {
        let tu = parse("typedef struct { float x, y; } Vec2;");
        assert_eq!(tu.cursors.len(), 2);
        assert_eq!(tu.cursors[0].kind, CursorKind::StructDecl);
        assert_eq!(tu.cursors[0].name, "Vec2");
        assert_eq!(tu.cursors[0].children.len(), 2);
        assert_eq!(tu.cursors[1].kind, CursorKind::TypedefDecl);
        assert_eq!(tu.cursors[1].type_spelling, "struct Vec2");
    }

    #[test]
    fn nested_definitions_stay_inside_fields() {
        let tu = parse("struct Outer { struct Inner { int a; } inner; union { int i; float f; }; int tail; };");
        assert_eq!(tu.cursors.len(), 1);
        let outer = &tu.cursors[0];
        let names: Vec<&str> = outer.children.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["inner", "tail"]);
        assert_eq!(outer.children[0].type_spelling, "struct Inner");
    }

    #[test]
    fn leading_comment_block() {
        let tu = parse(
            "// unrelated\n\n/**\n * @brief Adds.\n */\nint add(int a, int b);\n/// one\n/// two\nint sub(int a, int b);",
        );
        assert_eq!(
            tu.cursors[0].comment.as_deref(),
            Some("/**\n * @brief Adds.\n */")
        );
        assert_eq!(tu.cursors[1].comment.as_deref(), Some("/// one\n/// two"));
    }

    #[test]
    fn separated_comment_is_not_attached() {
        let tu = parse("/* license */\n\nint x;");
        assert_eq!(tu.cursors[0].comment, None);
    }

    #[test]
    fn member_comments_leading_and_trailing() {
        let tu = parse(
            "enum Color {\n    RED, ///< Red color\n    GREEN,\n    BLUE = 3 ///< Blue color\n};\nstruct P {\n    /// X coordinate\n    int x;\n    int y; ///< Y coordinate\n};",
        );
        let color = &tu.cursors[0].children;
        assert_eq!(color[0].comment.as_deref(), Some("///< Red color"));
        assert_eq!(color[1].comment, None);
        assert_eq!(color[2].comment.as_deref(), Some("///< Blue color"));

        let p = &tu.cursors[1].children;
        assert_eq!(p[0].comment.as_deref(), Some("/// X coordinate"));
        assert_eq!(p[1].comment.as_deref(), Some("///< Y coordinate"));
    }

    #[test]
    fn extern_c_blocks_are_transparent() {
        let tu = parse("#ifdef __cplusplus\nextern \"C\" {\n#endif\nvoid f(void);\n#ifdef __cplusplus\n}\n#endif\n");
        assert_eq!(tu.cursors.len(), 1);
        assert_eq!(tu.cursors[0].name, "f");
    }

    #[test]
    fn function_definitions_skip_body() {
        let tu = parse("static inline int twice(int v) { return v * 2; }\nint after;");
        assert_eq!(tu.cursors.len(), 2);
        assert!(tu.cursors[0].is_definition);
        assert_eq!(tu.cursors[0].type_spelling, "int");
        assert_eq!(tu.cursors[1].name, "after");
    }

    #[test]
    fn forward_declaration_is_not_a_definition() {
        let tu = parse("struct Opaque;\nstruct Opaque *open(void);");
        assert_eq!(tu.cursors[0].kind, CursorKind::StructDecl);
        assert!(!tu.cursors[0].is_definition);
        assert_eq!(tu.cursors[1].type_spelling, "struct Opaque *");
    }

    #[test]
    fn bitfields_and_multiple_declarators() {
        let tu = parse("struct Bits { unsigned a : 1, b : 3; int : 4; char *p, **pp; };");
        let fields: Vec<(&str, &str)> = tu.cursors[0]
            .children
            .iter()
            .map(|f| (f.name.as_str(), f.type_spelling.as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("a", "unsigned int"),
                ("b", "unsigned int"),
                ("p", "char *"),
                ("pp", "char **"),
            ]
        );
    }

    #[test]
    fn unknown_construct_is_skipped() {
        let tu = parse("int = 5;\nint ok;");
        assert_eq!(tu.cursors.len(), 1);
        assert_eq!(tu.cursors[0].name, "ok");
    }

    #[test]
    fn unbalanced_braces_are_fatal() {
        let err = TranslationUnit::parse("struct S { int x;").unwrap_err();
        assert!(err.to_string().contains("unbalanced"));
    }

    #[test]
    fn macro_prefix_before_builtin_is_ignored() {
        let tu = parse("API_EXPORT void shutdown(void);");
        assert_eq!(tu.cursors[0].kind, CursorKind::FunctionDecl);
        assert_eq!(tu.cursors[0].name, "shutdown");
        assert_eq!(tu.cursors[0].type_spelling, "void");
    }
}
