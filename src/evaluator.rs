//! # Evaluator
//!
//! Two layers: single-predicate evaluation against the database, and the
//! least fixed-point loop that applies rules until nothing new derives.
//!
//! A predicate evaluates to a relation whose header is its distinct
//! variable names in order of first appearance. Constants become value
//! selections, repeated variables become column-equality selections, and
//! the surviving rows are projected and renamed onto the variables. A rule
//! then natural-joins its body results left to right, projects the join
//! onto the head's attributes by name, and unions the outcome into the
//! head's relation.
//!
//! Termination is by size: operators only ever add rows, so a pass that
//! grows no relation means the fixed point is reached.

use crate::ast::{Predicate, Rule};
use crate::database::Database;
use crate::relation::Relation;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Evaluate one predicate, yielding the satisfying variable bindings.
///
/// A missing relation, an arity mismatch, or a constant outside the
/// domain all produce the empty relation rather than an error.
pub fn evaluate_query(predicate: &Predicate, db: &Database) -> Relation {
    let name = predicate.name.lexeme.as_str();

    // Classify each position: constants to select on, the first position
    // of each variable (kept and projected), and repeat positions that
    // must equal their first occurrence.
    let mut constants: Vec<(usize, &str)> = Vec::new();
    let mut first_positions: Vec<usize> = Vec::new();
    let mut variables: Vec<String> = Vec::new();
    let mut equalities: Vec<(usize, usize)> = Vec::new();
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (position, parameter) in predicate.parameters.iter().enumerate() {
        if let Some(lexeme) = parameter.as_constant() {
            constants.push((position, lexeme));
        } else if let Some(variable) = parameter.as_variable() {
            match seen.get(variable) {
                Some(&first) => equalities.push((first, position)),
                None => {
                    seen.insert(variable, position);
                    first_positions.push(position);
                    variables.push(variable.to_string());
                }
            }
        }
    }

    let empty = Relation::new(name, variables.clone());
    let Some(stored) = db.get(name) else {
        trace!(predicate = %predicate, "relation missing, empty result");
        return empty;
    };
    if stored.arity() != predicate.arity() {
        trace!(predicate = %predicate, "arity mismatch, empty result");
        return empty;
    }

    let mut relation = stored.clone();
    for (position, lexeme) in constants {
        let Some(value) = db.lookup(lexeme) else {
            // The constant never occurs in any fact.
            return empty;
        };
        relation = relation.select_value(position, value);
    }
    for (first, repeat) in equalities {
        relation = relation.select_eq(first, repeat);
    }
    relation
        .project(&first_positions)
        .rename(variables)
        .collapse()
}

/// Apply one rule once. Returns whether the head relation grew.
pub fn evaluate_rule(rule: &Rule, db: &mut Database) -> bool {
    trace!(rule = %rule, "evaluating rule");
    let mut bodies = rule.body.iter().map(|p| evaluate_query(p, db));
    let Some(mut joined) = bodies.next() else {
        return false;
    };
    for body in bodies {
        joined = joined.join(&body);
    }

    // Project onto the head's attribute list by name, in head order. A
    // head variable the body never binds derives nothing.
    let mut positions = Vec::with_capacity(rule.head.attributes.len());
    for attribute in &rule.head.attributes {
        match joined
            .header()
            .iter()
            .position(|column| *column == attribute.lexeme)
        {
            Some(position) => positions.push(position),
            None => {
                debug!(rule = %rule, variable = %attribute.lexeme, "unbound head variable");
                return false;
            }
        }
    }
    let projected = joined.project(&positions);

    // Positionally a no-op, but the stored header must stay the scheme's.
    let head_name = rule.head.name.lexeme.as_str();
    let target_header: Vec<String> = match db.get(head_name) {
        Some(existing) => existing.header().to_vec(),
        None => rule
            .head
            .attributes
            .iter()
            .map(|attr| attr.lexeme.clone())
            .collect(),
    };
    if target_header.len() != projected.arity() {
        debug!(rule = %rule, "head arity disagrees with stored relation");
        return false;
    }
    db.union(head_name, projected.rename(target_header))
}

/// Run every rule repeatedly until a whole pass derives nothing new.
/// Returns the number of passes, counting the final quiet one.
pub fn fixed_point(rules: &[&Rule], db: &mut Database) -> usize {
    let mut passes = 0;
    loop {
        passes += 1;
        let mut changed = false;
        for rule in rules {
            changed |= evaluate_rule(rule, db);
        }
        debug!(passes, changed, "completed pass");
        if !changed {
            return passes;
        }
    }
}
