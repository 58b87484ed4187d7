//! Tokenizer for C header text.
//!
//! Produces a flat [`Token`] stream plus a separate list of [`Comment`]s.
//! Each comment remembers the index of the token that follows it, which is
//! all the parser needs to attach documentation to declarations.
//! Preprocessor directives are skipped line by line.

use std::fmt;

use crate::error::{ParseError, Result};

/// Multi- and single-character punctuators, longest first.
const PUNCTUATORS: &[&str] = &[
    "...", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "->", "::", "{", "}", "(", ")", "[",
    "]", ";", ",", "*", "=", ":", "<", ">", "&", "|", "^", "~", "!", "+", "-", "/", "%", "?",
    ".",
];

/// Markers that make a comment document the member *before* it.
const TRAILING_MARKERS: &[&str] = &["///<", "//!<", "/**<", "/*!<"];

/// The kind and payload of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Number(String),
    /// String literal contents, without the quotes.
    Str(String),
    /// Character literal contents, without the quotes.
    Char(String),
    Punct(&'static str),
}

/// A token with the line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
}

impl Token {
    /// Whether this token is the given punctuator.
    pub fn is_punct(&self, punct: &str) -> bool {
        matches!(&self.kind, TokenKind::Punct(p) if *p == punct)
    }

    /// The identifier text, if this is an identifier.
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// Whether this token is the given identifier or keyword.
    pub fn is_ident(&self, word: &str) -> bool {
        self.ident() == Some(word)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::Ident(s) | TokenKind::Number(s) => write!(f, "{s}"),
            TokenKind::Str(s) => write!(f, "\"{s}\""),
            TokenKind::Char(s) => write!(f, "'{s}'"),
            TokenKind::Punct(p) => write!(f, "{p}"),
        }
    }
}

/// A comment, kept verbatim including its delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub start_line: u32,
    pub end_line: u32,
    /// Starts with a `<` marker (`///<`, `/**<`, ...).
    pub trailing: bool,
    /// Index of the first token after this comment.
    pub before_token: usize,
}

/// Output of [`Lexer::tokenize`].
#[derive(Debug, Clone, Default)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
}

/// Lexer for C header text.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: u32,
    /// Only whitespace seen since the last newline.
    at_line_start: bool,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            at_line_start: true,
        }
    }

    /// Tokenize the entire input.
    pub fn tokenize(mut self) -> Result<Lexed> {
        let mut lexed = Lexed::default();

        while let Some(ch) = self.peek() {
            match ch {
                '\n' => {
                    self.advance();
                    self.at_line_start = true;
                }
                c if c.is_whitespace() => {
                    self.advance();
                }
                '\\' if self.at_line_continuation() => self.skip_line_continuation(),
                '#' if self.at_line_start => self.skip_preprocessor_directive(),
                '/' if matches!(self.peek_ahead(1), Some('/') | Some('*')) => {
                    let comment = self.comment(lexed.tokens.len())?;
                    lexed.comments.push(comment);
                }
                _ => {
                    self.at_line_start = false;
                    let token = self.next_token()?;
                    lexed.tokens.push(token);
                }
            }
        }

        Ok(lexed)
    }

    fn next_token(&mut self) -> Result<Token> {
        let line = self.line;
        let ch = self.peek().ok_or_else(|| ParseError::Lex {
            line,
            detail: "unexpected end of input".to_string(),
        })?;

        let kind = match ch {
            '"' => TokenKind::Str(self.quoted('"')?),
            '\'' => TokenKind::Char(self.quoted('\'')?),
            '0'..='9' => TokenKind::Number(self.number()),
            '.' if self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) => {
                TokenKind::Number(self.number())
            }
            c if c == '_' || c.is_alphabetic() => TokenKind::Ident(self.identifier()),
            _ => TokenKind::Punct(self.punctuator()?),
        };

        Ok(Token { kind, line })
    }

    fn identifier(&mut self) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '_' || c.is_alphanumeric() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        text
    }

    /// Read a pp-number: digits, letters, dots and exponent signs.
    fn number(&mut self) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            let is_hex = text.starts_with("0x") || text.starts_with("0X");
            let exponent_sign = matches!(c, '+' | '-')
                && match text.chars().last() {
                    Some('e' | 'E') => !is_hex,
                    Some('p' | 'P') => is_hex,
                    _ => false,
                };
            if c.is_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        text
    }

    /// Read a string or character literal, returning its raw contents.
    fn quoted(&mut self, quote: char) -> Result<String> {
        let line = self.line;
        self.advance();
        let mut text = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => return Ok(text),
                Some('\\') => {
                    text.push('\\');
                    if let Some(escaped) = self.advance() {
                        text.push(escaped);
                    }
                }
                Some('\n') | None => {
                    return Err(ParseError::Lex {
                        line,
                        detail: format!("unterminated {quote}-quoted literal"),
                    });
                }
                Some(c) => text.push(c),
            }
        }
    }

    fn punctuator(&mut self) -> Result<&'static str> {
        for punct in PUNCTUATORS {
            let matches = punct
                .chars()
                .enumerate()
                .all(|(i, c)| self.peek_ahead(i) == Some(c));
            if matches {
                for _ in 0..punct.chars().count() {
                    self.advance();
                }
                return Ok(*punct);
            }
        }
        let line = self.line;
        let ch = self.peek().unwrap_or('?');
        Err(ParseError::Lex {
            line,
            detail: format!("unexpected character '{ch}'"),
        })
    }

    fn comment(&mut self, before_token: usize) -> Result<Comment> {
        let start_line = self.line;
        let mut text = String::new();

        if self.peek_ahead(1) == Some('/') {
            while let Some(c) = self.peek() {
                if c == '\n' {
                    break;
                }
                text.push(c);
                self.advance();
            }
            if text.ends_with('\r') {
                text.pop();
            }
        } else {
            text.push_str("/*");
            self.advance();
            self.advance();
            loop {
                match self.advance() {
                    Some('*') if self.peek() == Some('/') => {
                        self.advance();
                        text.push_str("*/");
                        break;
                    }
                    Some(c) => text.push(c),
                    None => {
                        return Err(ParseError::Lex {
                            line: start_line,
                            detail: "unterminated block comment".to_string(),
                        });
                    }
                }
            }
        }

        let trailing = TRAILING_MARKERS.iter().any(|m| text.starts_with(m));
        Ok(Comment {
            text,
            start_line,
            end_line: self.line,
            trailing,
            before_token,
        })
    }

    /// Skip a `#` directive, honoring backslash line continuations.
    fn skip_preprocessor_directive(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                '\\' if self.at_line_continuation() => self.skip_line_continuation(),
                '\n' => break,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// A backslash ending the line, with either `\n` or `\r\n` after it.
    fn at_line_continuation(&self) -> bool {
        self.peek() == Some('\\')
            && match self.peek_ahead(1) {
                Some('\n') => true,
                Some('\r') => self.peek_ahead(2) == Some('\n'),
                _ => false,
            }
    }

    fn skip_line_continuation(&mut self) {
        self.advance();
        if self.peek() == Some('\r') {
            self.advance();
        }
        self.advance();
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.input.get(self.position).copied()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }
}
