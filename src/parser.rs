//! # Parser
//!
//! Recursive descent over the significant token stream, producing a
//! [`Program`] or the first offending token as a [`TokenError`].
//!
//! The grammar is LL(1): every list in it is introduced by an `ID`, so one
//! token of lookahead decides whether a section keeps going. The four
//! section keywords are mandatory and ordered; Schemes and Queries must be
//! non-empty; Facts and Rules may be empty.
//!
//! Two checks beyond the raw grammar happen here because they need parse
//! state: each fact must name a declared scheme of matching arity (the
//! violation is reported at the fact's terminating period), and the domain
//! of string constants is collected fact by fact so the finished
//! [`Program`] owns it.

use crate::ast::{Expression, Fact, Parameter, Predicate, Program, Rule, Scheme};
use crate::error::{Result, TokenError};
use crate::lexer;
use crate::tokens::{Token, TokenKind};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Scan `source`, drop whitespace and comments, and parse.
pub fn parse(source: &str) -> Result<Program> {
    Parser::new(lexer::significant_tokens(source)).parse_program()
}

/// Single-use parser over a token stream ending in `EOF`.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Arity of each declared scheme, first declaration wins.
    arities: HashMap<String, usize>,
    domain: BTreeSet<String>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let line = tokens.last().map_or(1, |t| t.line + t.newline_count());
            tokens.push(Token::new(TokenKind::Eof, "", line));
        }
        Parser {
            tokens,
            pos: 0,
            arities: HashMap::new(),
            domain: BTreeSet::new(),
        }
    }

    /// program := 'Schemes' ':' scheme+ 'Facts' ':' fact*
    ///            'Rules' ':' rule* 'Queries' ':' query+ EOF
    pub fn parse_program(mut self) -> Result<Program> {
        self.expect(TokenKind::Schemes)?;
        self.expect(TokenKind::Colon)?;
        let mut schemes = vec![self.parse_declared_scheme()?];
        while self.peek().kind == TokenKind::Id {
            schemes.push(self.parse_declared_scheme()?);
        }
        debug!(count = schemes.len(), "parsed schemes");

        self.expect(TokenKind::Facts)?;
        self.expect(TokenKind::Colon)?;
        let mut facts = Vec::new();
        while self.peek().kind == TokenKind::Id {
            facts.push(self.parse_fact()?);
        }
        debug!(count = facts.len(), domain = self.domain.len(), "parsed facts");

        self.expect(TokenKind::Rules)?;
        self.expect(TokenKind::Colon)?;
        let mut rules = Vec::new();
        while self.peek().kind == TokenKind::Id {
            rules.push(self.parse_rule()?);
        }
        debug!(count = rules.len(), "parsed rules");

        self.expect(TokenKind::Queries)?;
        self.expect(TokenKind::Colon)?;
        let mut queries = vec![self.parse_query()?];
        while self.peek().kind == TokenKind::Id {
            queries.push(self.parse_query()?);
        }
        debug!(count = queries.len(), "parsed queries");

        self.expect(TokenKind::Eof)?;
        Ok(Program {
            schemes,
            facts,
            rules,
            queries,
            domain: self.domain,
        })
    }

    /// A scheme in the Schemes section; records its arity for fact checks.
    fn parse_declared_scheme(&mut self) -> Result<Scheme> {
        let scheme = self.parse_scheme()?;
        self.arities
            .entry(scheme.name.lexeme.clone())
            .or_insert_with(|| scheme.arity());
        Ok(scheme)
    }

    /// scheme := ID '(' ID (',' ID)* ')'
    ///
    /// Also the shape of a rule head, so no arity bookkeeping here.
    fn parse_scheme(&mut self) -> Result<Scheme> {
        let name = self.expect(TokenKind::Id)?;
        self.expect(TokenKind::LeftParen)?;
        let mut attributes = vec![self.expect(TokenKind::Id)?];
        while self.peek().kind == TokenKind::Comma {
            self.advance();
            attributes.push(self.expect(TokenKind::Id)?);
        }
        self.expect(TokenKind::RightParen)?;
        Ok(Scheme { name, attributes })
    }

    /// fact := ID '(' STRING (',' STRING)* ')' '.'
    fn parse_fact(&mut self) -> Result<Fact> {
        let name = self.expect(TokenKind::Id)?;
        self.expect(TokenKind::LeftParen)?;
        let mut values = vec![self.expect(TokenKind::Str)?];
        while self.peek().kind == TokenKind::Comma {
            self.advance();
            values.push(self.expect(TokenKind::Str)?);
        }
        self.expect(TokenKind::RightParen)?;
        let period = self.expect(TokenKind::Period)?;

        // The fact must match a declared scheme; the period is the
        // offending token for an undeclared name or an arity mismatch.
        if self.arities.get(&name.lexeme) != Some(&values.len()) {
            return Err(TokenError::new(period));
        }

        for value in &values {
            self.domain.insert(value.lexeme.clone());
        }
        Ok(Fact { name, values })
    }

    /// rule := scheme ':-' predicate (',' predicate)* '.'
    fn parse_rule(&mut self) -> Result<Rule> {
        let head = self.parse_scheme()?;
        self.expect(TokenKind::ColonDash)?;
        let mut body = vec![self.parse_predicate()?];
        while self.peek().kind == TokenKind::Comma {
            self.advance();
            body.push(self.parse_predicate()?);
        }
        self.expect(TokenKind::Period)?;
        Ok(Rule { head, body })
    }

    /// predicate := ID '(' parameter (',' parameter)* ')'
    fn parse_predicate(&mut self) -> Result<Predicate> {
        let name = self.expect(TokenKind::Id)?;
        self.expect(TokenKind::LeftParen)?;
        let mut parameters = vec![self.parse_parameter()?];
        while self.peek().kind == TokenKind::Comma {
            self.advance();
            parameters.push(self.parse_parameter()?);
        }
        self.expect(TokenKind::RightParen)?;
        Ok(Predicate { name, parameters })
    }

    /// parameter := STRING | ID | expression
    fn parse_parameter(&mut self) -> Result<Parameter> {
        match self.peek().kind {
            TokenKind::Str => Ok(Parameter::Str(self.advance())),
            TokenKind::Id => Ok(Parameter::Id(self.advance())),
            TokenKind::LeftParen => Ok(Parameter::Expr(Box::new(self.parse_expression()?))),
            _ => Err(TokenError::new(self.peek().clone())),
        }
    }

    /// expression := '(' parameter ('+'|'*') parameter ')'
    fn parse_expression(&mut self) -> Result<Expression> {
        let open = self.expect(TokenKind::LeftParen)?;
        let left = self.parse_parameter()?;
        let op = match self.peek().kind {
            TokenKind::Add | TokenKind::Multiply => self.advance(),
            _ => return Err(TokenError::new(self.peek().clone())),
        };
        let right = self.parse_parameter()?;
        self.expect(TokenKind::RightParen)?;
        Ok(Expression {
            open,
            left,
            op,
            right,
        })
    }

    /// query := predicate '?'
    fn parse_query(&mut self) -> Result<Predicate> {
        let predicate = self.parse_predicate()?;
        self.expect(TokenKind::QMark)?;
        Ok(predicate)
    }

    fn peek(&self) -> &Token {
        // `new` guarantees a trailing EOF, so the clamp always lands on it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        self.pos += 1;
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(TokenError::new(self.peek().clone()))
        }
    }
}
