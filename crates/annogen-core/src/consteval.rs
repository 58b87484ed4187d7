//! Integer constant expressions, as written in enum initializers.
//!
//! Identifiers resolve through a caller-supplied scope of enumerators
//! seen so far, so `B = A + 1` works across enums in the same header.

use std::collections::HashMap;

use annogen_cparse::lexer::{Lexer, Token, TokenKind};

use crate::error::{CoreError, Result};

/// Evaluate `expr` to an `i64`, with arithmetic wrapping like C's.
pub fn evaluate(expr: &str, scope: &HashMap<String, i64>) -> Result<i64> {
    let fail = |detail: String| CoreError::Eval {
        expr: expr.to_string(),
        detail,
    };

    let lexed = Lexer::new(expr)
        .tokenize()
        .map_err(|e| fail(e.to_string()))?;
    let mut evaluator = Evaluator {
        tokens: &lexed.tokens,
        pos: 0,
        scope,
    };
    let value = evaluator.conditional().map_err(fail)?;
    match evaluator.tokens.get(evaluator.pos) {
        Some(extra) => Err(fail(format!("unexpected '{extra}'"))),
        None => Ok(value),
    }
}

type EvalResult = std::result::Result<i64, String>;

struct Evaluator<'a> {
    tokens: &'a [Token],
    pos: usize,
    scope: &'a HashMap<String, i64>,
}

fn precedence(op: &str) -> Option<u8> {
    let prec = match op {
        "*" | "/" | "%" => 10,
        "+" | "-" => 9,
        "<<" | ">>" => 8,
        "<" | "<=" | ">" | ">=" => 7,
        "==" | "!=" => 6,
        "&" => 5,
        "^" => 4,
        "|" => 3,
        "&&" => 2,
        "||" => 1,
        _ => return None,
    };
    Some(prec)
}

fn apply(op: &str, lhs: i64, rhs: i64) -> EvalResult {
    let value = match op {
        "*" => lhs.wrapping_mul(rhs),
        "/" | "%" if rhs == 0 => return Err("division by zero".to_string()),
        "/" => lhs.wrapping_div(rhs),
        "%" => lhs.wrapping_rem(rhs),
        "+" => lhs.wrapping_add(rhs),
        "-" => lhs.wrapping_sub(rhs),
        "<<" | ">>" if !(0..64).contains(&rhs) => {
            return Err(format!("shift amount {rhs} out of range"))
        }
        "<<" => lhs.wrapping_shl(rhs as u32),
        ">>" => lhs.wrapping_shr(rhs as u32),
        "<" => (lhs < rhs) as i64,
        "<=" => (lhs <= rhs) as i64,
        ">" => (lhs > rhs) as i64,
        ">=" => (lhs >= rhs) as i64,
        "==" => (lhs == rhs) as i64,
        "!=" => (lhs != rhs) as i64,
        "&" => lhs & rhs,
        "^" => lhs ^ rhs,
        "|" => lhs | rhs,
        "&&" => (lhs != 0 && rhs != 0) as i64,
        "||" => (lhs != 0 || rhs != 0) as i64,
        _ => return Err(format!("unsupported operator '{op}'")),
    };
    Ok(value)
}

impl Evaluator<'_> {
    fn peek_punct(&self) -> Option<&'static str> {
        match self.tokens.get(self.pos).map(|t| &t.kind) {
            Some(TokenKind::Punct(p)) => Some(*p),
            _ => None,
        }
    }

    fn conditional(&mut self) -> EvalResult {
        let cond = self.binary(1)?;
        if self.peek_punct() != Some("?") {
            return Ok(cond);
        }
        self.pos += 1;
        let then = self.conditional()?;
        if self.peek_punct() != Some(":") {
            return Err("expected ':' in conditional expression".to_string());
        }
        self.pos += 1;
        let otherwise = self.conditional()?;
        Ok(if cond != 0 { then } else { otherwise })
    }

    /// Precedence climbing over left-associative binary operators.
    fn binary(&mut self, min_prec: u8) -> EvalResult {
        let mut lhs = self.unary()?;
        while let Some(op) = self.peek_punct() {
            let Some(prec) = precedence(op) else { break };
            if prec < min_prec {
                break;
            }
            self.pos += 1;
            let rhs = self.binary(prec + 1)?;
            lhs = apply(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> EvalResult {
        let token = self
            .tokens
            .get(self.pos)
            .ok_or_else(|| "unexpected end of expression".to_string())?;
        self.pos += 1;

        match &token.kind {
            TokenKind::Punct("-") => Ok(self.unary()?.wrapping_neg()),
            TokenKind::Punct("+") => self.unary(),
            TokenKind::Punct("~") => Ok(!self.unary()?),
            TokenKind::Punct("!") => Ok((self.unary()? == 0) as i64),
            TokenKind::Punct("(") => {
                let value = self.conditional()?;
                if self.peek_punct() != Some(")") {
                    return Err("expected ')'".to_string());
                }
                self.pos += 1;
                Ok(value)
            }
            TokenKind::Number(text) => parse_integer(text),
            TokenKind::Char(text) => parse_char(text),
            TokenKind::Ident(name) => self
                .scope
                .get(name)
                .copied()
                .ok_or_else(|| format!("unknown identifier '{name}'")),
            _ => Err(format!("unexpected '{token}'")),
        }
    }
}

/// Parse a C integer literal, including base prefixes and suffixes.
fn parse_integer(text: &str) -> EvalResult {
    let digits = text.trim_end_matches(['u', 'U', 'l', 'L']);
    let (radix, body) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if let Some(bin) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        (2, bin)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    u64::from_str_radix(body, radix)
        .map(|v| v as i64)
        .map_err(|_| format!("'{text}' is not an integer literal"))
}

/// Value of a character literal body such as `a`, `\n` or `\x41`.
fn parse_char(text: &str) -> EvalResult {
    let mut chars = text.chars();
    let value = match (chars.next(), chars.next()) {
        (Some('\\'), Some(escape)) => {
            let rest: String = chars.collect();
            match escape {
                'n' => 10,
                't' => 9,
                'r' => 13,
                'a' => 7,
                'b' => 8,
                'f' => 12,
                'v' => 11,
                'x' => i64::from_str_radix(&rest, 16)
                    .map_err(|_| format!("bad hex escape in '{text}'"))?,
                d @ '0'..='7' => i64::from_str_radix(&format!("{d}{rest}"), 8)
                    .map_err(|_| format!("bad octal escape in '{text}'"))?,
                other => other as i64,
            }
        }
        (Some(c), None) => c as i64,
        _ => return Err(format!("unsupported character literal '{text}'")),
    };
    Ok(value)
}
