//! # Abstract Syntax Tree
//!
//! Typed representation of a parsed Datalog program: schemes, facts, rules,
//! and queries, plus the domain of string constants collected from the
//! Facts section. Nodes keep the tokens they were parsed from so later
//! stages can anchor diagnostics to a source position.
//!
//! Parameters are a tagged sum: an identifier (a variable), a string
//! constant, or a parenthesized arithmetic expression. Expressions are
//! preserved syntactically but never evaluated; [`Program::first_unsupported`]
//! finds the first one sitting in a position the evaluator would have to
//! handle.

use crate::tokens::Token;
use std::collections::BTreeSet;
use std::fmt;

/// A relation declaration: name plus ordered attribute names.
///
/// Rule heads reuse this shape, which is why it also appears outside the
/// Schemes section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheme {
    pub name: Token,
    pub attributes: Vec<Token>,
}

impl Scheme {
    pub fn arity(&self) -> usize {
        self.attributes.len()
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name.lexeme, join_lexemes(&self.attributes))
    }
}

/// A ground tuple: name plus ordered string constants, e.g. `s('a','b').`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub name: Token,
    pub values: Vec<Token>,
}

impl Fact {
    pub fn arity(&self) -> usize {
        self.values.len()
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}).", self.name.lexeme, join_lexemes(&self.values))
    }
}

/// One argument position of a predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parameter {
    /// A variable.
    Id(Token),
    /// A string constant, lexeme kept verbatim with its quotes.
    Str(Token),
    /// A parenthesized arithmetic expression, parsed but never evaluated.
    Expr(Box<Expression>),
}

impl Parameter {
    /// The variable name, if this parameter is one.
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Parameter::Id(token) => Some(&token.lexeme),
            _ => None,
        }
    }

    /// The constant lexeme (quotes included), if this parameter is one.
    pub fn as_constant(&self) -> Option<&str> {
        match self {
            Parameter::Str(token) => Some(&token.lexeme),
            _ => None,
        }
    }

    /// The opening token of the first expression under this parameter.
    fn first_expression(&self) -> Option<&Token> {
        match self {
            Parameter::Expr(expr) => Some(&expr.open),
            _ => None,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Id(token) | Parameter::Str(token) => f.write_str(&token.lexeme),
            Parameter::Expr(expr) => expr.fmt(f),
        }
    }
}

/// `( parameter op parameter )` with op one of `+` and `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    /// The opening parenthesis, kept to anchor unsupported-input errors.
    pub open: Token,
    pub left: Parameter,
    /// An `ADD` or `MULTIPLY` token.
    pub op: Token,
    pub right: Parameter,
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}{}{})", self.left, self.op.lexeme, self.right)
    }
}

/// A relation name applied to parameters; the body of rules and queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub name: Token,
    pub parameters: Vec<Parameter>,
}

impl Predicate {
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Distinct variable names in order of first appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for parameter in &self.parameters {
            if let Some(name) = parameter.as_variable() {
                if !seen.contains(&name) {
                    seen.push(name);
                }
            }
        }
        seen
    }

    fn first_expression(&self) -> Option<&Token> {
        self.parameters.iter().find_map(Parameter::first_expression)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name.lexeme)?;
        for (i, parameter) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            parameter.fmt(f)?;
        }
        f.write_str(")")
    }
}

/// `head :- p1, ..., pn.` The head is scheme-shaped: identifiers only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub head: Scheme,
    pub body: Vec<Predicate>,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} :- ", self.head)?;
        for (i, predicate) in self.body.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            predicate.fmt(f)?;
        }
        f.write_str(".")
    }
}

/// A full program: the four sections in source order plus the domain.
///
/// The domain is the set of string constants appearing in Facts, collected
/// while parsing and read-only afterwards. Evaluation can never produce a
/// value outside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub schemes: Vec<Scheme>,
    pub facts: Vec<Fact>,
    pub rules: Vec<Rule>,
    pub queries: Vec<Predicate>,
    pub domain: BTreeSet<String>,
}

impl Program {
    /// The opening token of the first expression in an evaluated position:
    /// any rule body predicate or any query. `None` means the program is
    /// fully evaluable.
    pub fn first_unsupported(&self) -> Option<&Token> {
        self.rules
            .iter()
            .flat_map(|rule| &rule.body)
            .find_map(Predicate::first_expression)
            .or_else(|| self.queries.iter().find_map(Predicate::first_expression))
    }

    /// Counted section listing plus the sorted domain, one item per line.
    /// This is the shape of the parse-only report.
    pub fn summary(&self) -> String {
        use std::fmt::Write as _;

        let mut out = String::new();
        let _ = writeln!(out, "Schemes({}):", self.schemes.len());
        for scheme in &self.schemes {
            let _ = writeln!(out, "  {scheme}");
        }
        let _ = writeln!(out, "Facts({}):", self.facts.len());
        for fact in &self.facts {
            let _ = writeln!(out, "  {fact}");
        }
        let _ = writeln!(out, "Rules({}):", self.rules.len());
        for rule in &self.rules {
            let _ = writeln!(out, "  {rule}");
        }
        let _ = writeln!(out, "Queries({}):", self.queries.len());
        for query in &self.queries {
            let _ = writeln!(out, "  {query}?");
        }
        let _ = writeln!(out, "Domain({}):", self.domain.len());
        for value in &self.domain {
            let _ = writeln!(out, "  {value}");
        }
        out
    }
}

impl fmt::Display for Program {
    /// Canonical stringification; re-lexing and re-parsing it yields a
    /// structurally identical program.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Schemes:")?;
        for scheme in &self.schemes {
            writeln!(f, "  {scheme}")?;
        }
        writeln!(f, "Facts:")?;
        for fact in &self.facts {
            writeln!(f, "  {fact}")?;
        }
        writeln!(f, "Rules:")?;
        for rule in &self.rules {
            writeln!(f, "  {rule}")?;
        }
        writeln!(f, "Queries:")?;
        for query in &self.queries {
            writeln!(f, "  {query}?")?;
        }
        Ok(())
    }
}

fn join_lexemes(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.lexeme.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TokenKind;

    fn id(name: &str) -> Token {
        Token::new(TokenKind::Id, name, 1)
    }

    fn string(value: &str) -> Token {
        Token::new(TokenKind::Str, value, 1)
    }

    #[test]
    fn test_scheme_display() {
        let scheme = Scheme {
            name: id("snap"),
            attributes: vec![id("A"), id("B")],
        };
        assert_eq!(scheme.to_string(), "snap(A,B)");
    }

    #[test]
    fn test_fact_display_keeps_quotes() {
        let fact = Fact {
            name: id("snap"),
            values: vec![string("'a'"), string("'b'")],
        };
        assert_eq!(fact.to_string(), "snap('a','b').");
    }

    #[test]
    fn test_predicate_variables_distinct_in_order() {
        let predicate = Predicate {
            name: id("p"),
            parameters: vec![
                Parameter::Id(id("X")),
                Parameter::Str(string("'c'")),
                Parameter::Id(id("Y")),
                Parameter::Id(id("X")),
            ],
        };
        assert_eq!(predicate.variables(), vec!["X", "Y"]);
    }

    #[test]
    fn test_expression_display() {
        let expr = Expression {
            open: Token::new(TokenKind::LeftParen, "(", 1),
            left: Parameter::Id(id("X")),
            op: Token::new(TokenKind::Add, "+", 1),
            right: Parameter::Str(string("'1'")),
        };
        assert_eq!(expr.to_string(), "(X+'1')");
    }

    #[test]
    fn test_rule_display() {
        let rule = Rule {
            head: Scheme {
                name: id("path"),
                attributes: vec![id("A"), id("B")],
            },
            body: vec![Predicate {
                name: id("edge"),
                parameters: vec![Parameter::Id(id("A")), Parameter::Id(id("B"))],
            }],
        };
        assert_eq!(rule.to_string(), "path(A,B) :- edge(A,B).");
    }

    #[test]
    fn test_summary_counts_sections_and_lists_domain() {
        let program = Program {
            schemes: vec![Scheme {
                name: id("s"),
                attributes: vec![id("A"), id("B")],
            }],
            facts: vec![Fact {
                name: id("s"),
                values: vec![string("'b'"), string("'a'")],
            }],
            rules: Vec::new(),
            queries: vec![Predicate {
                name: id("s"),
                parameters: vec![Parameter::Id(id("X")), Parameter::Str(string("'a'"))],
            }],
            domain: ["'a'", "'b'"].iter().map(|s| s.to_string()).collect(),
        };
        assert_eq!(
            program.summary(),
            "Schemes(1):\n  s(A,B)\nFacts(1):\n  s('b','a').\nRules(0):\nQueries(1):\n  s(X,'a')?\nDomain(2):\n  'a'\n  'b'\n"
        );
    }

    #[test]
    fn test_first_unsupported_prefers_rule_bodies() {
        let expr = |line: usize| {
            Parameter::Expr(Box::new(Expression {
                open: Token::new(TokenKind::LeftParen, "(", line),
                left: Parameter::Id(id("X")),
                op: Token::new(TokenKind::Add, "+", line),
                right: Parameter::Id(id("Y")),
            }))
        };
        let program = Program {
            schemes: Vec::new(),
            facts: Vec::new(),
            rules: vec![Rule {
                head: Scheme {
                    name: id("p"),
                    attributes: vec![id("X")],
                },
                body: vec![Predicate {
                    name: id("q"),
                    parameters: vec![expr(3)],
                }],
            }],
            queries: vec![Predicate {
                name: id("q"),
                parameters: vec![expr(9)],
            }],
            domain: BTreeSet::new(),
        };
        assert_eq!(program.first_unsupported().map(|t| t.line), Some(3));
    }
}
