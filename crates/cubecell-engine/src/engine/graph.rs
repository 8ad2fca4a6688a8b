//! Dependency graph over canonical cell addresses.
//!
//! Two adjacency maps are kept as exact inverses of each other:
//! `dependencies` (what a cell reads) and `dependents` (who reads a cell).
//! An address is a node only while it is the source or target of an edge.
//! The graph is acyclic at all times: every mutation that would close a
//! cycle is rolled back before returning.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::cycle::detect_cycle;
use super::error::CycleError;

/// Adjacency map keyed by canonical address. Ordered so traversals are deterministic.
pub type Adjacency = BTreeMap<String, BTreeSet<String>>;

static NO_EDGES: BTreeSet<String> = BTreeSet::new();

/// Directed graph with an edge `cell -> referenced cell` for every reference
/// in a cell's formula.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    dependencies: Adjacency,
    dependents: Adjacency,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `node`'s outgoing edges with `dependencies` as one atomic step.
    ///
    /// On a cycle the graph is restored to exactly its state before the call.
    pub fn set_dependencies<I>(&mut self, node: &str, dependencies: I) -> Result<(), CycleError>
    where
        I: IntoIterator<Item = String>,
    {
        let dependencies: BTreeSet<String> = dependencies.into_iter().collect();
        if dependencies.contains(node) {
            return Err(CycleError::SelfReference(node.to_string()));
        }

        let previous = self.replace_edges(node, dependencies);
        if let Some(path) = detect_cycle(&self.dependencies) {
            self.replace_edges(node, previous);
            log::warn!("rejected dependencies of {node}: cycle {}", path.join(" -> "));
            return Err(CycleError::Cycle { path });
        }

        log::trace!("{node} now depends on {:?}", self.dependencies(node));
        Ok(())
    }

    /// Add the single edge `from -> to`, rolling it back if it closes a cycle.
    pub fn add_dependency(&mut self, from: &str, to: &str) -> Result<(), CycleError> {
        if from == to {
            return Err(CycleError::SelfReference(from.to_string()));
        }
        if self.dependencies(from).contains(to) {
            return Ok(());
        }

        self.link(from, to);
        if let Some(path) = detect_cycle(&self.dependencies) {
            self.remove_dependency(from, to);
            log::warn!("rejected edge {from} -> {to}: cycle {}", path.join(" -> "));
            return Err(CycleError::Cycle { path });
        }
        Ok(())
    }

    /// Remove the edge `from -> to` if present.
    pub fn remove_dependency(&mut self, from: &str, to: &str) {
        unlink(&mut self.dependencies, from, to);
        unlink(&mut self.dependents, to, from);
    }

    /// Remove all outgoing edges of `node`.
    pub fn clear_dependencies(&mut self, node: &str) {
        self.replace_edges(node, BTreeSet::new());
    }

    /// Cells that `node` reads (possibly empty).
    pub fn dependencies(&self, node: &str) -> &BTreeSet<String> {
        self.dependencies.get(node).unwrap_or(&NO_EDGES)
    }

    /// Cells that read `node` (possibly empty).
    pub fn dependents(&self, node: &str) -> &BTreeSet<String> {
        self.dependents.get(node).unwrap_or(&NO_EDGES)
    }

    /// Every cell that reads `node` directly or through other cells.
    pub fn transitive_dependents(&self, node: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut to_process: Vec<&str> = vec![node];
        while let Some(current) = to_process.pop() {
            for dependent in self.dependents(current) {
                if seen.insert(dependent.clone()) {
                    to_process.push(dependent);
                }
            }
        }
        seen
    }

    /// All addresses that currently take part in at least one edge.
    pub fn nodes(&self) -> BTreeSet<&str> {
        self.dependencies
            .keys()
            .chain(self.dependents.keys())
            .map(String::as_str)
            .collect()
    }

    pub fn contains(&self, node: &str) -> bool {
        self.dependencies.contains_key(node) || self.dependents.contains_key(node)
    }

    pub fn len(&self) -> usize {
        self.nodes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty() && self.dependents.is_empty()
    }

    pub fn has_cycle(&self) -> bool {
        self.detect_cycle().is_some()
    }

    /// Path of the first cycle found, if any.
    pub fn detect_cycle(&self) -> Option<Vec<String>> {
        detect_cycle(&self.dependencies)
    }

    /// Order every node so that each cell comes after all of its dependencies
    /// (Kahn's algorithm). Returns None if any cycle exists in the graph.
    pub fn topological_order(&self) -> Option<Vec<String>> {
        let nodes = self.nodes();
        let mut in_degree: BTreeMap<&str, usize> = nodes
            .iter()
            .map(|node| (*node, self.dependencies(node).len()))
            .collect();

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(node, _)| *node)
            .collect();

        let mut order = Vec::with_capacity(nodes.len());
        while let Some(node) = queue.pop_front() {
            order.push(node.to_string());
            for dependent in self.dependents(node) {
                if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        if order.len() < nodes.len() {
            return None;
        }
        Some(order)
    }

    /// Swap in a new outgoing edge set for `node`, returning the old one.
    fn replace_edges(&mut self, node: &str, dependencies: BTreeSet<String>) -> BTreeSet<String> {
        let previous = self.dependencies.remove(node).unwrap_or_default();
        for dependency in &previous {
            unlink(&mut self.dependents, dependency, node);
        }
        for dependency in &dependencies {
            self.dependents
                .entry(dependency.clone())
                .or_default()
                .insert(node.to_string());
        }
        if !dependencies.is_empty() {
            self.dependencies.insert(node.to_string(), dependencies);
        }
        previous
    }

    /// Build a graph from raw `from -> to` edges, skipping every cycle check.
    #[cfg(any(test, feature = "test-util"))]
    pub fn from_edges_unchecked<'e>(edges: impl IntoIterator<Item = (&'e str, &'e str)>) -> Self {
        let mut graph = Self::new();
        for (from, to) in edges {
            graph.link(from, to);
        }
        graph
    }

    fn link(&mut self, from: &str, to: &str) {
        self.dependencies
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
        self.dependents
            .entry(to.to_string())
            .or_default()
            .insert(from.to_string());
    }
}

/// Remove `to` from `map[from]`, dropping the entry once it is empty.
fn unlink(map: &mut Adjacency, from: &str, to: &str) {
    if let Some(set) = map.get_mut(from) {
        set.remove(to);
        if set.is_empty() {
            map.remove(from);
        }
    }
}
