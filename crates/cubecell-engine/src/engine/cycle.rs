//! Circular dependency detection over the dependency graph.
//!
//! A formula may not (transitively) read its own cell. This module runs a
//! depth-first search over every node with outgoing edges, tracking the set
//! of nodes on the active path; reaching a node already on that path is a
//! back-edge and therefore a cycle.
//!
//! The search keeps an explicit frame stack so long reference chains do not
//! exhaust the thread stack.

use std::collections::{BTreeSet, HashSet, btree_set};

use super::graph::Adjacency;

static NO_EDGES: BTreeSet<String> = BTreeSet::new();

/// Detect a cycle anywhere in the graph.
/// Returns Some(cycle_path) if a cycle is found (first node repeated at the end), None otherwise.
pub fn detect_cycle(dependencies: &Adjacency) -> Option<Vec<String>> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_path: HashSet<&str> = HashSet::new();

    for start in dependencies.keys() {
        if !visited.insert(start.as_str()) {
            continue;
        }
        on_path.insert(start.as_str());
        let mut frames: Vec<(&str, btree_set::Iter<'_, String>)> =
            vec![(start.as_str(), edges(dependencies, start))];

        loop {
            let Some((_, iter)) = frames.last_mut() else {
                break;
            };
            match iter.next() {
                Some(next) => {
                    let next = next.as_str();
                    if on_path.contains(next) {
                        return Some(cycle_path(&frames, next));
                    }
                    if visited.insert(next) {
                        on_path.insert(next);
                        frames.push((next, edges(dependencies, next)));
                    }
                }
                None => {
                    if let Some((node, _)) = frames.pop() {
                        on_path.remove(node);
                    }
                }
            }
        }
    }

    None
}

fn edges<'a>(dependencies: &'a Adjacency, node: &str) -> btree_set::Iter<'a, String> {
    dependencies.get(node).unwrap_or(&NO_EDGES).iter()
}

fn cycle_path(frames: &[(&str, btree_set::Iter<'_, String>)], back_edge: &str) -> Vec<String> {
    let from = frames
        .iter()
        .position(|(node, _)| *node == back_edge)
        .unwrap_or(0);
    let mut path: Vec<String> = frames[from..]
        .iter()
        .map(|(node, _)| node.to_string())
        .collect();
    path.push(back_edge.to_string());
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn adjacency(edges: &[(&str, &str)]) -> Adjacency {
        let mut map = Adjacency::new();
        for (from, to) in edges {
            map.entry(from.to_string())
                .or_default()
                .insert(to.to_string());
        }
        map
    }

    #[test]
    fn test_detect_cycle_no_cycle() {
        let graph = adjacency(&[("C1", "A1"), ("C1", "B1"), ("B1", "A1")]);
        assert!(detect_cycle(&graph).is_none());
    }

    #[test]
    fn test_detect_cycle_direct() {
        let graph = adjacency(&[("A1", "B1"), ("B1", "A1")]);
        assert_eq!(
            detect_cycle(&graph),
            Some(vec!["A1".to_string(), "B1".to_string(), "A1".to_string()])
        );
    }

    #[test]
    fn test_detect_cycle_indirect() {
        let graph = adjacency(&[("A1", "B1"), ("B1", "C1"), ("C1", "A1")]);
        let path = detect_cycle(&graph).unwrap();
        assert_eq!(path.len(), 4);
        assert_eq!(path.first(), path.last());
    }

    #[test]
    fn test_detect_cycle_in_unrelated_component() {
        let graph = adjacency(&[("A1", "B1"), ("X1", "Y1"), ("Y1", "Z1"), ("Z1", "Y1")]);
        let path = detect_cycle(&graph).unwrap();
        assert_eq!(path, vec!["Y1", "Z1", "Y1"]);
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let graph = adjacency(&[("D1", "B1"), ("D1", "C1"), ("B1", "A1"), ("C1", "A1")]);
        assert!(detect_cycle(&graph).is_none());
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let names: Vec<String> = (1..=50_000).map(|row| format!("A{row}")).collect();
        let mut graph = Adjacency::new();
        for pair in names.windows(2) {
            graph
                .entry(pair[1].clone())
                .or_default()
                .insert(pair[0].clone());
        }
        assert!(detect_cycle(&graph).is_none());
    }
}
