//! # Database
//!
//! The fact store: one relation per declared scheme, plus the string
//! interner every stored value goes through. Facts populate it once (the
//! extensional database); rule evaluation unions derived tuples into the
//! same mapping in place (the intensional database).
//!
//! Owning the interner is what makes domain closure structural: only
//! values from the Facts section ever get interned, so a constant outside
//! the domain cannot be represented, let alone stored. Lookups of unknown
//! constants simply miss.

use crate::ast::Program;
use crate::relation::{Relation, Row, Value};
use lasso::Rodeo;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Mapping from relation name to relation, with the shared interner.
pub struct Database {
    rodeo: Rodeo,
    relations: HashMap<String, Relation>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("relations", &self.relations)
            .field("domain_size", &self.rodeo.len())
            .finish()
    }
}

impl Database {
    /// Build the extensional database: an empty relation per scheme
    /// (first declaration wins on a duplicate name), then one row per
    /// fact. The parser has already matched every fact to its scheme.
    pub fn from_program(program: &Program) -> Self {
        let mut rodeo = Rodeo::default();
        let mut relations: HashMap<String, Relation> = HashMap::new();

        for scheme in &program.schemes {
            relations
                .entry(scheme.name.lexeme.clone())
                .or_insert_with(|| {
                    let header = scheme
                        .attributes
                        .iter()
                        .map(|attr| attr.lexeme.clone())
                        .collect();
                    Relation::new(scheme.name.lexeme.clone(), header)
                });
        }

        for fact in &program.facts {
            let row: Row = fact
                .values
                .iter()
                .map(|value| rodeo.get_or_intern(&value.lexeme))
                .collect();
            if let Some(relation) = relations.get_mut(&fact.name.lexeme) {
                relation.insert(row);
            }
        }

        debug!(
            relations = relations.len(),
            domain = rodeo.len(),
            "built extensional database"
        );
        Database { rodeo, relations }
    }

    pub fn get(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    /// The interned key for a constant lexeme; `None` when the constant
    /// never appeared in Facts and so can match nothing.
    pub fn lookup(&self, lexeme: &str) -> Option<Value> {
        self.rodeo.get(lexeme)
    }

    pub fn resolve(&self, value: Value) -> &str {
        self.rodeo.resolve(&value)
    }

    /// Union `incoming` into the relation called `name`, creating it for
    /// a head with no declared scheme. Returns whether the body grew.
    pub fn union(&mut self, name: &str, incoming: Relation) -> bool {
        match self.relations.get_mut(name) {
            Some(existing) => {
                debug_assert_eq!(existing.arity(), incoming.arity());
                let before = existing.len();
                for row in incoming.rows() {
                    existing.insert(row.clone());
                }
                existing.len() > before
            }
            None => {
                debug!(relation = name, "creating relation for underived head");
                let grew = !incoming.is_empty();
                self.relations.insert(name.to_string(), incoming.with_name(name));
                grew
            }
        }
    }

    pub fn relations(&self) -> impl Iterator<Item = (&str, &Relation)> {
        self.relations.iter().map(|(name, rel)| (name.as_str(), rel))
    }

    /// Fully resolved copy of every relation body, in deterministic
    /// order. Handy for comparing evaluation strategies.
    pub fn snapshot(&self) -> BTreeMap<String, BTreeSet<Vec<String>>> {
        self.relations
            .iter()
            .map(|(name, rel)| {
                let rows = rel
                    .rows()
                    .map(|row| row.iter().map(|&v| self.resolve(v).to_string()).collect())
                    .collect();
                (name.clone(), rows)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn program(source: &str) -> Program {
        parser::parse(source).expect("test program parses")
    }

    #[test]
    fn test_edb_has_one_relation_per_scheme() {
        let db = Database::from_program(&program(
            "Schemes: s(A,B) t(C)\nFacts: s('a','b').\nRules:\nQueries: s(X,Y)?",
        ));
        assert_eq!(db.get("s").map(Relation::len), Some(1));
        assert_eq!(db.get("t").map(Relation::len), Some(0));
        assert!(db.get("u").is_none());
    }

    #[test]
    fn test_duplicate_facts_collapse() {
        let db = Database::from_program(&program(
            "Schemes: s(A)\nFacts: s('a'). s('a'). s('b').\nRules:\nQueries: s(X)?",
        ));
        assert_eq!(db.get("s").map(Relation::len), Some(2));
    }

    #[test]
    fn test_lookup_misses_outside_domain() {
        let db = Database::from_program(&program(
            "Schemes: s(A)\nFacts: s('a').\nRules:\nQueries: s(X)?",
        ));
        assert!(db.lookup("'a'").is_some());
        assert!(db.lookup("'z'").is_none());
    }

    #[test]
    fn test_union_reports_growth() {
        let mut db = Database::from_program(&program(
            "Schemes: s(A)\nFacts: s('a').\nRules:\nQueries: s(X)?",
        ));
        let existing = db.get("s").expect("s exists").clone();
        // Unioning a relation back into itself adds nothing.
        assert!(!db.union("s", existing.clone()));
        // A fresh name creates the relation and counts as growth.
        assert!(db.union("derived", existing.rename(vec!["X".to_string()])));
        assert_eq!(db.get("derived").map(Relation::len), Some(1));
    }

    #[test]
    fn test_snapshot_resolves_values() {
        let db = Database::from_program(&program(
            "Schemes: s(A,B)\nFacts: s('a','b').\nRules:\nQueries: s(X,Y)?",
        ));
        let snapshot = db.snapshot();
        let rows = snapshot.get("s").expect("s present");
        assert!(rows.contains(&vec!["'a'".to_string(), "'b'".to_string()]));
    }
}
