//! # Recursion Support
//!
//! Rule dependency analysis: the rule graph, Tarjan's strongly connected
//! components, and with them the evaluation order.
//!
//! Rules get stable indices in declaration order. Rule `r` depends on rule
//! `s` when some body predicate of `r` names the head of `s`; a rule can
//! depend on itself:
//!
//! ```text
//! path(A,B) :- edge(A,B).          R0
//! path(A,C) :- edge(A,B), path(B,C).   R1 depends on R0 and itself
//! ```
//!
//! Tarjan pops a component only after every component it reaches, so the
//! components come out dependencies-first. That is exactly the evaluation
//! order: saturate what a component needs before running the component.

use crate::ast::Rule;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Directed dependencies between rules, indexed by rule position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    /// `edges[r]` holds every rule `r` depends on, in ascending order.
    edges: Vec<BTreeSet<usize>>,
}

/// One pass over the rules: map head names to indices, then resolve every
/// body predicate against that map.
pub fn build_dependency_graph(rules: &[Rule]) -> DependencyGraph {
    let mut by_head: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, rule) in rules.iter().enumerate() {
        by_head
            .entry(rule.head.name.lexeme.as_str())
            .or_default()
            .push(index);
    }

    let edges = rules
        .iter()
        .map(|rule| {
            let mut dependencies = BTreeSet::new();
            for predicate in &rule.body {
                if let Some(indices) = by_head.get(predicate.name.lexeme.as_str()) {
                    dependencies.extend(indices.iter().copied());
                }
            }
            dependencies
        })
        .collect();
    DependencyGraph { edges }
}

impl DependencyGraph {
    pub fn rule_count(&self) -> usize {
        self.edges.len()
    }

    pub fn dependencies(&self, rule: usize) -> &BTreeSet<usize> {
        &self.edges[rule]
    }

    /// A rule whose body names its own head.
    pub fn has_self_loop(&self, rule: usize) -> bool {
        self.edges[rule].contains(&rule)
    }

    /// Strongly connected components, dependencies-first, each component's
    /// members in ascending rule order.
    pub fn sccs(&self) -> Vec<Vec<usize>> {
        let mut tarjan = Tarjan {
            graph: self,
            counter: 0,
            index: vec![None; self.rule_count()],
            lowlink: vec![0; self.rule_count()],
            on_stack: vec![false; self.rule_count()],
            stack: Vec::new(),
            components: Vec::new(),
        };
        for rule in 0..self.rule_count() {
            if tarjan.index[rule].is_none() {
                tarjan.connect(rule);
            }
        }
        for component in &mut tarjan.components {
            component.sort_unstable();
        }
        tarjan.components
    }
}

impl fmt::Display for DependencyGraph {
    /// One line per rule: `R<i>:R<j1>,R<j2>,...` with ascending indices.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (rule, dependencies) in self.edges.iter().enumerate() {
            let targets = dependencies
                .iter()
                .map(|d| format!("R{d}"))
                .collect::<Vec<_>>()
                .join(",");
            writeln!(f, "R{rule}:{targets}")?;
        }
        Ok(())
    }
}

struct Tarjan<'graph> {
    graph: &'graph DependencyGraph,
    counter: usize,
    index: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    components: Vec<Vec<usize>>,
}

impl Tarjan<'_> {
    fn connect(&mut self, v: usize) {
        self.index[v] = Some(self.counter);
        self.lowlink[v] = self.counter;
        self.counter += 1;
        self.stack.push(v);
        self.on_stack[v] = true;

        for &w in self.graph.dependencies(v) {
            match self.index[w] {
                None => {
                    self.connect(w);
                    self.lowlink[v] = self.lowlink[v].min(self.lowlink[w]);
                }
                Some(w_index) if self.on_stack[w] => {
                    self.lowlink[v] = self.lowlink[v].min(w_index);
                }
                Some(_) => {}
            }
        }

        if Some(self.lowlink[v]) == self.index[v] {
            let mut component = Vec::new();
            while let Some(w) = self.stack.pop() {
                self.on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            self.components.push(component);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn rules(source: &str) -> Vec<Rule> {
        parser::parse(source).expect("test program parses").rules
    }

    #[test]
    fn test_single_rule_without_dependencies() {
        let rules = rules("Schemes: e(A,B) r(A,B)\nFacts:\nRules: r(X,Y) :- e(X,Y).\nQueries: r(X,Y)?");
        let graph = build_dependency_graph(&rules);
        assert_eq!(graph.to_string(), "R0:\n");
        assert!(!graph.has_self_loop(0));
        assert_eq!(graph.sccs(), vec![vec![0]]);
    }

    #[test]
    fn test_transitive_closure_graph() {
        let rules = rules(
            "Schemes: edge(A,B) path(A,B)\nFacts:\n\
             Rules: path(A,B) :- edge(A,B).\n       path(A,C) :- edge(A,B), path(B,C).\n\
             Queries: path(X,Y)?",
        );
        let graph = build_dependency_graph(&rules);
        assert_eq!(graph.to_string(), "R0:\nR1:R0,R1\n");
        assert!(graph.has_self_loop(1));
        // R1 needs R0 saturated first.
        assert_eq!(graph.sccs(), vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_mutual_recursion_is_one_component() {
        let rules = rules(
            "Schemes: e(A,B) p(A,B) q(A,B)\nFacts:\n\
             Rules: p(X,Y) :- q(X,Y).\n       q(X,Y) :- p(X,Y).\n       q(X,Y) :- e(X,Y).\n\
             Queries: p(X,Y)?",
        );
        let graph = build_dependency_graph(&rules);
        // R0 depends on both q rules; each q rule feeds from p or e.
        assert_eq!(graph.to_string(), "R0:R1,R2\nR1:R0\nR2:\n");
        let sccs = graph.sccs();
        assert!(sccs.contains(&vec![0, 1]));
        assert!(sccs.contains(&vec![2]));
        // The base rule comes before the cycle that feeds on it.
        assert_eq!(sccs.last(), Some(&vec![0, 1]));
    }

    #[test]
    fn test_dependencies_come_before_dependents() {
        let rules = rules(
            "Schemes: a(X) b(X) c(X)\nFacts:\n\
             Rules: c(X) :- b(X).\n       b(X) :- a(X).\n\
             Queries: c(X)?",
        );
        let graph = build_dependency_graph(&rules);
        assert_eq!(graph.sccs(), vec![vec![1], vec![0]]);
    }

    #[test]
    fn test_no_rules_yields_empty_graph() {
        let graph = build_dependency_graph(&[]);
        assert_eq!(graph.rule_count(), 0);
        assert_eq!(graph.to_string(), "");
        assert!(graph.sccs().is_empty());
    }
}
