//! # Lexical Analyzer
//!
//! Character stream to token stream. Scanning is longest-match with a fixed
//! kind priority: comments, then strings (an unterminated string or block
//! comment becomes one `UNDEFINED` token running to end of input), then
//! whitespace, reserved words, identifiers, `:-` before `:`, and finally
//! single-character punctuation. A character no rule matches is emitted as
//! a one-character `UNDEFINED` token and scanning resumes after it.
//!
//! The scanner never aborts. Whether an `UNDEFINED` token is fatal is the
//! parser's call, which is why whitespace and comments are produced here
//! and filtered by the caller.

use crate::tokens::{Token, TokenKind};
use tracing::{debug, trace};

/// Scan the entire source, keeping every token including whitespace and
/// comments. The stream always ends with a single `EOF` token.
///
/// Line numbers start at 1 and advance by the newline count of each
/// emitted lexeme, so a token's line is the line of its first character.
pub fn scan(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = source;
    let mut line = 1;

    while !rest.is_empty() {
        let token = next_token(rest, line);
        trace!(kind = %token.kind, line = token.line, "scanned token");
        if token.kind == TokenKind::Undefined {
            debug!(lexeme = %token.lexeme.escape_debug(), line = token.line, "undefined input");
        }
        rest = &rest[token.lexeme.len()..];
        line += token.newline_count();
        tokens.push(token);
    }

    tokens.push(Token::new(TokenKind::Eof, "", line));
    tokens
}

/// Scan and keep only the tokens the parser consumes.
pub fn significant_tokens(source: &str) -> Vec<Token> {
    scan(source)
        .into_iter()
        .filter(|t| !matches!(t.kind, TokenKind::Whitespace | TokenKind::Comment))
        .collect()
}

fn next_token(rest: &str, line: usize) -> Token {
    scan_comment(rest, line)
        .or_else(|| scan_string(rest, line))
        .or_else(|| scan_whitespace(rest, line))
        .or_else(|| scan_word(rest, line))
        .or_else(|| scan_punctuation(rest, line))
        .unwrap_or_else(|| {
            let end = rest.chars().next().map_or(0, char::len_utf8);
            Token::new(TokenKind::Undefined, &rest[..end], line)
        })
}

/// `#` to end of line, or a `#|...|#` block. Blocks do not nest; a block
/// opener with no closer swallows the rest of the input as `UNDEFINED`.
fn scan_comment(rest: &str, line: usize) -> Option<Token> {
    if !rest.starts_with('#') {
        return None;
    }
    if rest[1..].starts_with('|') {
        return match rest[2..].find("|#") {
            Some(at) => Some(Token::new(TokenKind::Comment, &rest[..at + 4], line)),
            None => Some(Token::new(TokenKind::Undefined, rest, line)),
        };
    }
    let end = rest.find('\n').unwrap_or(rest.len());
    Some(Token::new(TokenKind::Comment, &rest[..end], line))
}

/// Single-quoted, with `''` standing for an internal quote. The lexeme
/// keeps the quotes. No terminator means `UNDEFINED` to end of input.
fn scan_string(rest: &str, line: usize) -> Option<Token> {
    if !rest.starts_with('\'') {
        return None;
    }
    let bytes = rest.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(Token::new(TokenKind::Str, &rest[..=i], line));
        }
        i += 1;
    }
    Some(Token::new(TokenKind::Undefined, rest, line))
}

fn scan_whitespace(rest: &str, line: usize) -> Option<Token> {
    let end = rest
        .find(|c: char| !c.is_whitespace())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    Some(Token::new(TokenKind::Whitespace, &rest[..end], line))
}

/// A reserved word, unless it is immediately followed by an identifier
/// character, in which case the whole run lexes as one `ID`.
fn scan_word(rest: &str, line: usize) -> Option<Token> {
    const RESERVED: [(&str, TokenKind); 4] = [
        ("Schemes", TokenKind::Schemes),
        ("Facts", TokenKind::Facts),
        ("Rules", TokenKind::Rules),
        ("Queries", TokenKind::Queries),
    ];

    for (word, kind) in RESERVED {
        if rest.starts_with(word) {
            let at_boundary = rest[word.len()..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_ascii_alphanumeric());
            if at_boundary {
                return Some(Token::new(kind, word, line));
            }
        }
    }

    if !rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let end = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    Some(Token::new(TokenKind::Id, &rest[..end], line))
}

fn scan_punctuation(rest: &str, line: usize) -> Option<Token> {
    if rest.starts_with(":-") {
        return Some(Token::new(TokenKind::ColonDash, ":-", line));
    }
    let kind = match rest.chars().next()? {
        ':' => TokenKind::Colon,
        ',' => TokenKind::Comma,
        '.' => TokenKind::Period,
        '?' => TokenKind::QMark,
        '(' => TokenKind::LeftParen,
        ')' => TokenKind::RightParen,
        '+' => TokenKind::Add,
        '*' => TokenKind::Multiply,
        _ => return None,
    };
    Some(Token::new(kind, &rest[..1], line))
}
