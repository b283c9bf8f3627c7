//! Formula tokenizer.
//!
//! Splits formula text (without the leading `=`) into numbers, cell
//! references, arithmetic operators and parentheses. Whitespace between
//! tokens is skipped.

use super::formula::FormulaSyntaxError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Number(f64),
    /// Letters followed by digits, kept verbatim until the parser resolves it.
    CellRef(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset of the token in the formula text.
    pub offset: usize,
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, FormulaSyntaxError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        let kind = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '0'..='9' | '.' => {
                let end = scan_number(input, offset);
                let literal = &input[offset..end];
                let n = literal.parse::<f64>().map_err(|_| {
                    FormulaSyntaxError::new(offset, format!("invalid number '{}'", literal))
                })?;
                while chars.peek().is_some_and(|&(i, _)| i < end) {
                    chars.next();
                }
                tokens.push(Token {
                    kind: TokenKind::Number(n),
                    offset,
                });
                continue;
            }
            'A'..='Z' | 'a'..='z' => {
                let mut ident = String::new();
                while let Some(&(_, ch)) = chars.peek() {
                    if ch.is_ascii_alphanumeric() {
                        ident.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::CellRef(ident),
                    offset,
                });
                continue;
            }
            other => {
                return Err(FormulaSyntaxError::new(
                    offset,
                    format!("unexpected character '{}'", other),
                ));
            }
        };
        chars.next();
        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}

/// Find the end of a numeric literal: digits, an optional fraction and an
/// optional exponent (`1`, `2.5`, `.5`, `1e-3`).
fn scan_number(input: &str, start: usize) -> usize {
    let bytes = input.as_bytes();
    let mut i = start;
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    i
}
