//! # Interpreter
//!
//! The program driver. Owns the parsed program and its database, runs the
//! rules to a least fixed point, answers the queries, and renders the
//! batch report.
//!
//! Two evaluation strategies share the same fixed-point core. The
//! optimized one decomposes the rule graph into strongly connected
//! components and evaluates them dependencies-first, confining iteration
//! to actual cycles; a lone rule outside any cycle runs exactly once. The
//! plain one iterates the whole rule list until quiet. Both finish in the
//! same database.

use crate::ast::{Predicate, Program, Rule};
use crate::database::Database;
use crate::error::{Result, TokenError};
use crate::evaluator;
use crate::recursion::{self, DependencyGraph};
use std::fmt::Write as _;
use tracing::{debug, info};

/// Pass count for one strongly connected component, rules ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SccEvaluation {
    pub passes: usize,
    pub rules: Vec<usize>,
}

/// A parsed program paired with its (initially extensional) database.
#[derive(Debug)]
pub struct Interpreter {
    program: Program,
    database: Database,
}

impl Interpreter {
    /// Build the extensional database for `program`.
    ///
    /// Rejects programs the evaluator cannot handle: an expression in a
    /// rule body or query fails here, anchored at its opening parenthesis,
    /// so a bad program produces no partial evaluation.
    pub fn new(program: Program) -> Result<Self> {
        if let Some(token) = program.first_unsupported() {
            return Err(TokenError::new(token.clone()));
        }
        info!(
            schemes = program.schemes.len(),
            facts = program.facts.len(),
            rules = program.rules.len(),
            queries = program.queries.len(),
            "interpreting program"
        );
        let database = Database::from_program(&program);
        Ok(Interpreter { program, database })
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Evaluate the rules component by component, dependencies first.
    ///
    /// A singleton component with no self-loop is applied once; anything
    /// else iterates to its own fixed point. Returns the graph and the
    /// per-component pass counts in evaluation order.
    pub fn evaluate_optimized(&mut self) -> (DependencyGraph, Vec<SccEvaluation>) {
        let graph = recursion::build_dependency_graph(&self.program.rules);
        let mut evaluations = Vec::with_capacity(graph.rule_count());
        for component in graph.sccs() {
            let passes = if component.len() == 1 && !graph.has_self_loop(component[0]) {
                evaluator::evaluate_rule(&self.program.rules[component[0]], &mut self.database);
                1
            } else {
                let rules: Vec<&Rule> = component
                    .iter()
                    .map(|&index| &self.program.rules[index])
                    .collect();
                evaluator::fixed_point(&rules, &mut self.database)
            };
            debug!(?component, passes, "evaluated component");
            evaluations.push(SccEvaluation {
                passes,
                rules: component,
            });
        }
        (graph, evaluations)
    }

    /// Evaluate the whole rule list to a fixed point, returning passes.
    pub fn evaluate_fixed_point(&mut self) -> usize {
        let rules: Vec<&Rule> = self.program.rules.iter().collect();
        evaluator::fixed_point(&rules, &mut self.database)
    }

    /// The optimized batch report: dependency graph, per-component pass
    /// counts, then query results, as blank-line separated sections.
    pub fn run_optimized(&mut self) -> String {
        let (graph, evaluations) = self.evaluate_optimized();
        let mut out = String::new();
        out.push_str("Dependency Graph\n");
        out.push_str(&graph.to_string());
        out.push('\n');

        out.push_str("Rule Evaluation\n");
        for evaluation in &evaluations {
            let rules = evaluation
                .rules
                .iter()
                .map(|index| format!("R{index}"))
                .collect::<Vec<_>>()
                .join(",");
            let _ = writeln!(out, "{} passes: {rules}", evaluation.passes);
        }
        out.push('\n');

        out.push_str("Query Evaluation\n");
        out.push_str(&self.query_results());
        out
    }

    /// The plain batch report: whole-program pass count, then queries.
    pub fn run_fixed_point(&mut self) -> String {
        let passes = self.evaluate_fixed_point();
        let mut out = String::new();
        let _ = writeln!(out, "Schemes populated after {passes} passes through the Rules.");
        out.push_str(&self.query_results());
        out
    }

    /// Per-query output in source order.
    pub fn query_results(&self) -> String {
        let mut out = String::new();
        for query in &self.program.queries {
            out.push_str(&self.format_query(query));
        }
        out
    }

    fn format_query(&self, query: &Predicate) -> String {
        let result = evaluator::evaluate_query(query, &self.database);
        if result.is_empty() {
            return format!("{query}? No\n");
        }
        let mut out = format!("{query}? Yes({})\n", result.len());
        if result.header().is_empty() {
            // Ground query: one match, no bindings to list.
            return out;
        }

        let mut rows: Vec<Vec<&str>> = result
            .rows()
            .map(|row| {
                row.iter()
                    .map(|&value| strip_quotes(self.database.resolve(value)))
                    .collect()
            })
            .collect();
        rows.sort_unstable();
        for row in rows {
            let bindings = result
                .header()
                .iter()
                .zip(row)
                .map(|(variable, value)| format!("{variable}={value}"))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(out, "  {bindings}");
        }
        out
    }
}

/// Binding lines print constants without their quotes.
fn strip_quotes(lexeme: &str) -> &str {
    lexeme
        .strip_prefix('\'')
        .and_then(|inner| inner.strip_suffix('\''))
        .unwrap_or(lexeme)
}
