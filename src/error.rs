//! Error types for parsing and evaluation.
//!
//! Every failure in the pipeline is anchored to a token: lexical errors
//! ride along as `UNDEFINED` tokens until the parser trips over them,
//! grammar violations point at the first offending token, and unsupported
//! input (an expression in an evaluated position) points at the
//! expression's opening parenthesis.

use crate::tokens::Token;
use thiserror::Error;

/// The first token that violated the grammar or evaluator support.
///
/// Displays in the failure-report shape: `(KIND,"lexeme",line)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{token}")]
pub struct TokenError {
    pub token: Token,
}

impl TokenError {
    pub fn new(token: Token) -> Self {
        TokenError { token }
    }

    /// The two-line report printed on any failed run.
    pub fn report(&self) -> String {
        format!("Failure!\n  {}", self.token)
    }
}

pub type Result<T> = std::result::Result<T, TokenError>;
