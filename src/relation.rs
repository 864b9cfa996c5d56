//! # Relation Engine
//!
//! Named-column relations and the operators rule evaluation is built on:
//! select, project, rename, natural join, and duplicate-column collapse.
//! All operations are pure; inputs are untouched and the result is a new
//! relation.
//!
//! A body is a set of rows and a row is a vector of interned string keys,
//! so row equality and join probing reduce to integer comparison. Most
//! relations here are low arity and join keys are short, which is what
//! makes the hash-index probe in [`Relation::join`] cheap.

use lasso::Spur;
use std::collections::{HashMap, HashSet};

/// An interned string constant.
pub type Value = Spur;

/// One tuple of a relation body.
pub type Row = Vec<Value>;

/// A named header plus a deduplicated set of rows of matching arity.
///
/// Header names are distinct for relations built from schemes. Duplicates
/// can appear transiently after a rename and are resolved with
/// [`Relation::collapse`] before a relation is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    name: String,
    header: Vec<String>,
    body: HashSet<Row>,
}

impl Relation {
    pub fn new(name: impl Into<String>, header: Vec<String>) -> Self {
        Relation {
            name: name.into(),
            header,
            body: HashSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn arity(&self) -> usize {
        self.header.len()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.body.iter()
    }

    /// Add one row. Returns whether the body grew.
    pub fn insert(&mut self, row: Row) -> bool {
        debug_assert_eq!(row.len(), self.header.len());
        self.body.insert(row)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// σ: keep the rows whose `column` holds `value`.
    pub fn select_value(&self, column: usize, value: Value) -> Relation {
        debug_assert!(column < self.arity());
        Relation {
            name: self.name.clone(),
            header: self.header.clone(),
            body: self
                .body
                .iter()
                .filter(|row| row[column] == value)
                .cloned()
                .collect(),
        }
    }

    /// σ: keep the rows whose `left` and `right` columns agree.
    pub fn select_eq(&self, left: usize, right: usize) -> Relation {
        debug_assert!(left < self.arity() && right < self.arity());
        Relation {
            name: self.name.clone(),
            header: self.header.clone(),
            body: self
                .body
                .iter()
                .filter(|row| row[left] == row[right])
                .cloned()
                .collect(),
        }
    }

    /// π: keep `columns` in the given order, deduplicating rows.
    pub fn project(&self, columns: &[usize]) -> Relation {
        debug_assert!(columns.iter().all(|&i| i < self.arity()));
        let header = columns.iter().map(|&i| self.header[i].clone()).collect();
        let mut projected = Relation::new(self.name.clone(), header);
        for row in &self.body {
            projected.body.insert(columns.iter().map(|&i| row[i]).collect());
        }
        projected
    }

    /// ρ: replace the whole header at once; the body is untouched.
    pub fn rename(&self, header: Vec<String>) -> Relation {
        debug_assert_eq!(header.len(), self.header.len());
        Relation {
            name: self.name.clone(),
            header,
            body: self.body.clone(),
        }
    }

    /// ⋈: natural join on every column name the headers share.
    ///
    /// The output header is this relation's header followed by the other
    /// relation's non-shared columns. With no shared names this is the
    /// cartesian product, on its own code path so no join keys get built.
    pub fn join(&self, other: &Relation) -> Relation {
        // First occurrence on each side of every shared name.
        let mut shared: Vec<(usize, usize)> = Vec::new();
        for (left_pos, name) in self.header.iter().enumerate() {
            if self.header[..left_pos].contains(name) {
                continue;
            }
            if let Some(right_pos) = other.header.iter().position(|c| c == name) {
                shared.push((left_pos, right_pos));
            }
        }
        let shared_names: HashSet<&str> = shared
            .iter()
            .map(|&(l, _)| self.header[l].as_str())
            .collect();
        let kept: Vec<usize> = other
            .header
            .iter()
            .enumerate()
            .filter(|(_, name)| !shared_names.contains(name.as_str()))
            .map(|(i, _)| i)
            .collect();

        let mut header = self.header.clone();
        header.extend(kept.iter().map(|&i| other.header[i].clone()));
        let mut joined = Relation::new(self.name.clone(), header);

        if shared.is_empty() {
            for left in &self.body {
                for right in &other.body {
                    let mut row = left.clone();
                    row.extend(kept.iter().map(|&i| right[i]));
                    joined.body.insert(row);
                }
            }
            return joined;
        }

        // Index the left operand by its shared-column key, probe with the
        // right operand's rows.
        let mut index: HashMap<Vec<Value>, Vec<&Row>> = HashMap::new();
        for left in &self.body {
            let key = shared.iter().map(|&(l, _)| left[l]).collect();
            index.entry(key).or_default().push(left);
        }
        for right in &other.body {
            let key: Vec<Value> = shared.iter().map(|&(_, r)| right[r]).collect();
            if let Some(matches) = index.get(&key) {
                for left in matches {
                    let mut row = (*left).clone();
                    row.extend(kept.iter().map(|&i| right[i]));
                    joined.body.insert(row);
                }
            }
        }
        joined
    }

    /// Resolve duplicate column names: keep only the rows where all
    /// same-named columns agree, then keep the first occurrence of each
    /// name. Repeated variables in a head or query enforce equality this
    /// way. A relation with distinct names comes back unchanged.
    pub fn collapse(&self) -> Relation {
        let mut keep: Vec<usize> = Vec::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut by_name: HashMap<&str, usize> = HashMap::new();
        for (pos, name) in self.header.iter().enumerate() {
            match by_name.get(name.as_str()) {
                Some(&group) => groups[group].push(pos),
                None => {
                    by_name.insert(name, groups.len());
                    groups.push(vec![pos]);
                    keep.push(pos);
                }
            }
        }
        if keep.len() == self.header.len() {
            return self.clone();
        }

        let header = keep.iter().map(|&i| self.header[i].clone()).collect();
        let mut collapsed = Relation::new(self.name.clone(), header);
        for row in &self.body {
            let agrees = groups
                .iter()
                .all(|group| group.iter().all(|&p| row[p] == row[group[0]]));
            if agrees {
                collapsed.body.insert(keep.iter().map(|&p| row[p]).collect());
            }
        }
        collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lasso::Rodeo;

    fn relation(name: &str, header: &[&str], rows: &[&[&str]], rodeo: &mut Rodeo) -> Relation {
        let mut rel = Relation::new(name, header.iter().map(|&c| c.to_string()).collect());
        for row in rows {
            rel.insert(row.iter().map(|&v| rodeo.get_or_intern(v)).collect());
        }
        rel
    }

    #[test]
    fn test_insert_deduplicates() {
        let mut rodeo = Rodeo::default();
        let rel = relation("s", &["A"], &[&["x"], &["x"], &["y"]], &mut rodeo);
        assert_eq!(rel.len(), 2);
    }

    #[test]
    fn test_select_value() {
        let mut rodeo = Rodeo::default();
        let rel = relation("s", &["A", "B"], &[&["a", "b"], &["c", "b"], &["a", "d"]], &mut rodeo);
        let a = rodeo.get_or_intern("a");
        let selected = rel.select_value(0, a);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected.header(), rel.header());
    }

    #[test]
    fn test_select_eq() {
        let mut rodeo = Rodeo::default();
        let rel = relation("s", &["A", "B"], &[&["a", "a"], &["a", "b"]], &mut rodeo);
        let selected = rel.select_eq(0, 1);
        assert_eq!(selected.len(), 1);
        let aa = vec![rodeo.get_or_intern("a"), rodeo.get_or_intern("a")];
        assert!(selected.rows().any(|row| *row == aa));
    }

    #[test]
    fn test_select_order_is_irrelevant() {
        let mut rodeo = Rodeo::default();
        let rel = relation(
            "s",
            &["A", "B"],
            &[&["a", "a"], &["a", "b"], &["c", "c"]],
            &mut rodeo,
        );
        let a = rodeo.get_or_intern("a");
        let one = rel.select_value(0, a).select_eq(0, 1);
        let two = rel.select_eq(0, 1).select_value(0, a);
        assert_eq!(one, two);
    }

    #[test]
    fn test_project_preserves_order_and_deduplicates() {
        let mut rodeo = Rodeo::default();
        let rel = relation("s", &["A", "B"], &[&["a", "b"], &["c", "b"]], &mut rodeo);
        let projected = rel.project(&[1]);
        assert_eq!(projected.header(), ["B"]);
        assert_eq!(projected.len(), 1);

        let swapped = rel.project(&[1, 0]);
        assert_eq!(swapped.header(), ["B", "A"]);
        assert_eq!(swapped.len(), 2);
    }

    #[test]
    fn test_project_to_zero_columns_yields_single_empty_row() {
        let mut rodeo = Rodeo::default();
        let rel = relation("s", &["A", "B"], &[&["a", "b"], &["c", "d"]], &mut rodeo);
        let projected = rel.project(&[]);
        assert_eq!(projected.len(), 1);
    }

    #[test]
    fn test_rename_changes_header_only() {
        let mut rodeo = Rodeo::default();
        let rel = relation("s", &["A", "B"], &[&["a", "b"]], &mut rodeo);
        let renamed = rel.rename(vec!["X".to_string(), "Y".to_string()]);
        assert_eq!(renamed.header(), ["X", "Y"]);
        assert_eq!(renamed.len(), 1);
    }

    #[test]
    fn test_join_on_shared_column() {
        let mut rodeo = Rodeo::default();
        let left = relation("e", &["A", "B"], &[&["1", "2"], &["2", "3"]], &mut rodeo);
        let right = relation("e", &["B", "C"], &[&["2", "5"], &["4", "6"]], &mut rodeo);
        let joined = left.join(&right);
        assert_eq!(joined.header(), ["A", "B", "C"]);
        assert_eq!(joined.len(), 1);
        let expected = vec![
            rodeo.get_or_intern("1"),
            rodeo.get_or_intern("2"),
            rodeo.get_or_intern("5"),
        ];
        assert!(joined.rows().any(|row| *row == expected));
    }

    #[test]
    fn test_join_without_shared_columns_is_cartesian() {
        let mut rodeo = Rodeo::default();
        let left = relation("l", &["A"], &[&["1"], &["2"]], &mut rodeo);
        let right = relation("r", &["B"], &[&["x"], &["y"]], &mut rodeo);
        let joined = left.join(&right);
        assert_eq!(joined.header(), ["A", "B"]);
        assert_eq!(joined.len(), 4);
    }

    #[test]
    fn test_join_commutes_on_name_keyed_rows() {
        let mut rodeo = Rodeo::default();
        let left = relation(
            "l",
            &["A", "B"],
            &[&["1", "2"], &["2", "3"], &["3", "3"]],
            &mut rodeo,
        );
        let right = relation("r", &["B", "C"], &[&["2", "5"], &["3", "7"]], &mut rodeo);

        let one = left.join(&right);
        let two = right.join(&left);
        assert_eq!(one.len(), two.len());

        // Same rows once both are keyed by column name.
        let keyed = |rel: &Relation| -> HashSet<Vec<(String, String)>> {
            rel.rows()
                .map(|row| {
                    let mut pairs: Vec<_> = rel
                        .header()
                        .iter()
                        .cloned()
                        .zip(row.iter().map(|v| rodeo.resolve(v).to_string()))
                        .collect();
                    pairs.sort();
                    pairs
                })
                .collect()
        };
        assert_eq!(keyed(&one), keyed(&two));
    }

    #[test]
    fn test_collapse_enforces_equality_across_same_named_columns() {
        let mut rodeo = Rodeo::default();
        let rel = relation("s", &["X", "X"], &[&["a", "a"], &["a", "b"]], &mut rodeo);
        let collapsed = rel.collapse();
        assert_eq!(collapsed.header(), ["X"]);
        assert_eq!(collapsed.len(), 1);
        let a = vec![rodeo.get_or_intern("a")];
        assert!(collapsed.rows().any(|row| *row == a));
    }

    #[test]
    fn test_collapse_without_duplicates_is_identity() {
        let mut rodeo = Rodeo::default();
        let rel = relation("s", &["A", "B"], &[&["a", "b"]], &mut rodeo);
        assert_eq!(rel.collapse(), rel);
    }
}
