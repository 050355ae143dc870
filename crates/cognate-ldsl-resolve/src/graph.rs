//! Dependor graph
//!
//! Maps a declaration name to the set of declaration names that reference
//! it ("is depended upon by"). Every declaration in the program has an
//! entry, possibly empty, so downstream consumers can assume total
//! coverage. The graph is never mutated after the build phase.

use std::collections::VecDeque;
use std::fmt::Write as _;

use cognate_ldsl_ast::Name;
use indexmap::{IndexMap, IndexSet};

/// Directed dependency graph over declaration names
#[derive(Debug, Default, Clone)]
pub struct DependorGraph {
    /// name → names that reference it
    dependors: IndexMap<Name, IndexSet<Name>>,
}

impl DependorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure an entry exists for a name, without adding any edge
    pub fn add_entry(&mut self, name: &Name) {
        self.dependors.entry(name.clone()).or_default();
    }

    /// Record that `dependor` references `dependency` (edge
    /// dependency → dependor)
    pub fn add_dependor(&mut self, dependency: &Name, dependor: &Name) {
        self.dependors
            .entry(dependency.clone())
            .or_default()
            .insert(dependor.clone());
    }

    /// Names that directly reference `name`
    ///
    /// Total coverage holds after the build phase, so a missing entry is a
    /// consumer bug; an empty set is returned rather than panicking.
    pub fn dependors_of(&self, name: &Name) -> impl Iterator<Item = &Name> {
        self.dependors.get(name).into_iter().flatten()
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.dependors.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &Name> {
        self.dependors.keys()
    }

    pub fn len(&self) -> usize {
        self.dependors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependors.is_empty()
    }

    /// Whether `dependent` depends on `dependency`, directly or
    /// transitively. Breadth-first traversal of dependor edges starting
    /// from `dependency`.
    pub fn is_dependent_on(&self, dependent: &Name, dependency: &Name) -> bool {
        let mut queue = VecDeque::new();
        queue.push_back(dependency);

        let mut visited: IndexSet<&Name> = IndexSet::new();

        while let Some(current) = queue.pop_front() {
            if current == dependent {
                return true;
            }
            visited.insert(current);
            for next in self.dependors_of(current) {
                if !visited.contains(next) {
                    queue.push_back(next);
                }
            }
        }

        false
    }

    /// Human-readable dump for `--dependor-graph` diagnostics
    pub fn format(&self) -> String {
        let mut out = String::new();
        for (name, dependors) in &self.dependors {
            let list: Vec<&str> = dependors.iter().map(|n| n.as_str()).collect();
            let _ = writeln!(out, "{name} <- [{}]", list.join(", "));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str)], names: &[&str]) -> DependorGraph {
        let mut g = DependorGraph::new();
        for name in names {
            g.add_entry(&Name::from(*name));
        }
        for (dependency, dependor) in edges {
            g.add_dependor(&Name::from(*dependency), &Name::from(*dependor));
        }
        g
    }

    #[test]
    fn test_direct_dependency() {
        // b references a
        let g = graph(&[("a", "b")], &["a", "b"]);
        assert!(g.is_dependent_on(&Name::from("b"), &Name::from("a")));
        assert!(!g.is_dependent_on(&Name::from("a"), &Name::from("b")));
    }

    #[test]
    fn test_transitive_dependency() {
        // a -> b -> c
        let g = graph(&[("a", "b"), ("b", "c")], &["a", "b", "c"]);
        assert!(g.is_dependent_on(&Name::from("c"), &Name::from("a")));
        assert!(!g.is_dependent_on(&Name::from("a"), &Name::from("c")));
    }

    #[test]
    fn test_cyclic_reachability_terminates() {
        // a -> b -> a
        let g = graph(&[("a", "b"), ("b", "a")], &["a", "b"]);
        assert!(g.is_dependent_on(&Name::from("a"), &Name::from("b")));
        assert!(g.is_dependent_on(&Name::from("b"), &Name::from("a")));
    }

    #[test]
    fn test_every_entry_present() {
        let g = graph(&[("a", "b")], &["a", "b", "isolated"]);
        assert!(g.contains(&Name::from("isolated")));
        assert_eq!(g.dependors_of(&Name::from("isolated")).count(), 0);
    }

    #[test]
    fn test_format_lists_dependors() {
        let g = graph(&[("a", "b"), ("a", "c")], &["a", "b", "c"]);
        let dump = g.format();
        assert!(dump.contains("a <- [b, c]"));
        assert!(dump.contains("b <- []"));
    }
}
