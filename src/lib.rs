//! # Groundlog Datalog Interpreter
//!
//! A bottom-up Datalog interpreter: a textual program of schemes, facts,
//! rules, and queries is evaluated offline as a batch, and every query is
//! answered with the tuples derivable under minimal-model semantics.
//!
//! ## Pipeline Architecture
//!
//! ```text
//! Datalog Source Code
//!     ↓
//! [Lexer]                 → tokens with line numbers
//!     ↓
//! [Parser]                → Program AST + domain
//!     ↓
//! [Database]              → extensional database (facts)
//!     ↓
//! [Recursion Analysis]    → rule graph + SCCs, dependencies first
//!     ↓
//! [Fixed-point Evaluator] → intensional database (derived tuples)
//!     ↓
//! [Query Evaluator]       → satisfying bindings per query
//!     ↓
//! Batch report
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use groundlog::{parser, Interpreter};
//!
//! let source = "\
//! Schemes: edge(A,B) path(A,B)
//! Facts: edge('1','2'). edge('2','3').
//! Rules: path(A,B) :- edge(A,B).
//!        path(A,C) :- edge(A,B), path(B,C).
//! Queries: path('1',X)?";
//!
//! let program = parser::parse(source)?;
//! let mut interpreter = Interpreter::new(program)?;
//! let report = interpreter.run_optimized();
//! assert!(report.contains("path('1',X)? Yes(2)"));
//! # Ok::<(), groundlog::TokenError>(())
//! ```
//!
//! ## Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `tokens` | Token kinds and values |
//! | `lexer` | Characters → tokens |
//! | `parser` | Tokens → AST |
//! | `ast` | Program representation + domain |
//! | `relation` | Named-column relations: select, project, rename, join |
//! | `database` | Fact store with interned values |
//! | `evaluator` | Query evaluation and the fixed-point loop |
//! | `recursion` | Rule graph, Tarjan's SCCs, evaluation order |
//! | `interpreter` | Driver and batch report |
//! | `config` | Layered configuration |

pub mod ast;
pub mod config;
pub mod database;
pub mod error;
pub mod evaluator;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod recursion;
pub mod relation;
pub mod tokens;

// Re-export the types most callers touch
pub use ast::{Expression, Fact, Parameter, Predicate, Program, Rule, Scheme};
pub use config::Config;
pub use database::Database;
pub use error::TokenError;
pub use interpreter::{Interpreter, SccEvaluation};
pub use recursion::{build_dependency_graph, DependencyGraph};
pub use relation::{Relation, Row, Value};
pub use tokens::{Token, TokenKind};
