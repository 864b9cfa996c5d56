//! # Tokens
//!
//! Token kinds and token values shared by the lexer and parser.
//!
//! A token is a kind, the exact lexeme it was scanned from, and the line
//! number of its first character. Lexemes are kept verbatim, so a `STRING`
//! token still carries its surrounding quotes and any doubled internal
//! quotes. That makes token output and error reporting a faithful echo of
//! the source text.

use std::fmt;

/// Every token kind the scanner can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Comma,
    Period,
    QMark,
    LeftParen,
    RightParen,
    Colon,
    ColonDash,
    Add,
    Multiply,
    Schemes,
    Facts,
    Rules,
    Queries,
    Id,
    Str,
    Comment,
    Whitespace,
    Undefined,
    Eof,
}

impl TokenKind {
    /// Upper-case name used in token dumps and failure reports.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Comma => "COMMA",
            TokenKind::Period => "PERIOD",
            TokenKind::QMark => "Q_MARK",
            TokenKind::LeftParen => "LEFT_PAREN",
            TokenKind::RightParen => "RIGHT_PAREN",
            TokenKind::Colon => "COLON",
            TokenKind::ColonDash => "COLON_DASH",
            TokenKind::Add => "ADD",
            TokenKind::Multiply => "MULTIPLY",
            TokenKind::Schemes => "SCHEMES",
            TokenKind::Facts => "FACTS",
            TokenKind::Rules => "RULES",
            TokenKind::Queries => "QUERIES",
            TokenKind::Id => "ID",
            TokenKind::Str => "STRING",
            TokenKind::Comment => "COMMENT",
            TokenKind::Whitespace => "WHITESPACE",
            TokenKind::Undefined => "UNDEFINED",
            TokenKind::Eof => "EOF",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single scanned token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    /// The matched source text, verbatim.
    pub lexeme: String,
    /// 1-based line of the lexeme's first character.
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }

    /// How many lines this token spans beyond its first.
    pub fn newline_count(&self) -> usize {
        self.lexeme.matches('\n').count()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},\"{}\",{})", self.kind, self.lexeme, self.line)
    }
}
