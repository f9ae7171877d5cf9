//! Package import graph
//!
//! Tracks imports between the packages of one program and provides:
//! - cycle detection
//! - dependency-first ordering for checking

use std::collections::{BTreeMap, BTreeSet};

use super::error::LoadError;

/// Import graph keyed by import path. Only edges between packages present
/// in the graph are recorded; imports of unknown paths are left to the
/// checker.
#[derive(Debug, Default)]
pub struct PackageGraph {
    imports: BTreeMap<String, BTreeSet<String>>,
}

impl PackageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_package(&mut self, path: &str) {
        self.imports.entry(path.to_string()).or_default();
    }

    /// Record that `from` imports `to`.
    pub fn add_import(&mut self, from: &str, to: &str) {
        self.add_package(from);
        self.imports
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    fn deps<'a>(&'a self, path: &str) -> impl Iterator<Item = &'a String> + 'a {
        self.imports
            .get(path)
            .into_iter()
            .flatten()
            .filter(|dep| self.imports.contains_key(*dep))
    }

    /// Packages with every dependency before its importers; ties broken by
    /// path so the order is stable.
    pub fn topological_order(&self) -> Result<Vec<String>, LoadError> {
        let mut order = Vec::with_capacity(self.imports.len());
        let mut done = BTreeSet::new();
        let mut stack = Vec::new();
        for start in self.imports.keys() {
            self.visit(start, &mut done, &mut stack, &mut order)?;
        }
        Ok(order)
    }

    fn visit(
        &self,
        path: &str,
        done: &mut BTreeSet<String>,
        stack: &mut Vec<String>,
        order: &mut Vec<String>,
    ) -> Result<(), LoadError> {
        if done.contains(path) {
            return Ok(());
        }
        if let Some(start) = stack.iter().position(|p| p == path) {
            let mut cycle: Vec<String> = stack[start..].to_vec();
            cycle.push(path.to_string());
            return Err(LoadError::ImportCycle(cycle));
        }
        stack.push(path.to_string());
        for dep in self.deps(path) {
            self.visit(dep, done, stack, order)?;
        }
        stack.pop();
        done.insert(path.to_string());
        order.push(path.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependencies_come_first() {
        let mut graph = PackageGraph::new();
        graph.add_import("a", "database/sql");
        graph.add_import("a", "log");
        graph.add_import("database/sql", "context");
        graph.add_package("context");
        graph.add_package("log");
        let order = graph.topological_order().unwrap();
        let pos = |p: &str| order.iter().position(|x| x == p).unwrap();
        assert!(pos("context") < pos("database/sql"));
        assert!(pos("database/sql") < pos("a"));
        assert!(pos("log") < pos("a"));
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn test_unknown_imports_are_ignored() {
        let mut graph = PackageGraph::new();
        graph.add_import("a", "missing");
        assert_eq!(graph.topological_order().unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn test_cycle_is_reported_with_path() {
        let mut graph = PackageGraph::new();
        graph.add_import("a", "b");
        graph.add_import("b", "c");
        graph.add_import("c", "a");
        match graph.topological_order() {
            Err(LoadError::ImportCycle(cycle)) => {
                assert_eq!(cycle, vec!["a", "b", "c", "a"]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }
}
