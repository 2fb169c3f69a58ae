//! Inter-module dependency graph (spec 4.9). Nodes are module names; an
//! edge `a -> b` means `a` imports from `b`. Built on `petgraph` for the
//! underlying adjacency storage, with Kahn's algorithm and a Johnson-style
//! simple-cycle enumeration implemented directly on top so module-name
//! tie-breaks stay under our control (spec 5: "ties are broken by
//! lexicographic module name").

use std::collections::{BTreeMap, BTreeSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

/// One simple cycle, as an ordered chain of module names repeating the
/// first entry at the end (e.g. `["a", "b", "a"]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub modules: Vec<String>,
}

impl Cycle {
    pub fn render(&self) -> String {
        self.modules.join(" -> ")
    }
}

#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    index_of: BTreeMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures `name` has a node even with no imports (spec 4.9: "Module
    /// nodes are created even with no imports, so they appear in the
    /// topological order").
    pub fn add_module(&mut self, name: &str) -> NodeIndex {
        if let Some(idx) = self.index_of.get(name) {
            return *idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.index_of.insert(name.to_string(), idx);
        idx
    }

    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from_idx = self.add_module(from);
        let to_idx = self.add_module(to);
        if !self.graph.edges(from_idx).any(|e| e.target() == to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.index_of.keys().map(|s| s.as_str())
    }

    pub fn dependencies_of(&self, name: &str) -> BTreeSet<String> {
        let Some(idx) = self.index_of.get(name) else { return BTreeSet::new() };
        self.graph.edges(*idx).map(|e| self.graph[e.target()].clone()).collect()
    }

    /// Kahn's algorithm, ready-set ties broken lexicographically. Returns
    /// the full module list in topological order, or the set of simple
    /// cycles found if the graph is not a DAG (spec 4.9: "Cycle presence is
    /// fail-fast").
    pub fn topological_order(&self) -> Result<Vec<String>, Vec<Cycle>> {
        let mut in_degree: BTreeMap<NodeIndex, usize> =
            self.graph.node_indices().map(|idx| (idx, 0)).collect();
        for edge in self.graph.edge_references() {
            *in_degree.entry(edge.target()).or_insert(0) += 1;
        }

        let mut ready: BTreeSet<(String, NodeIndex)> = in_degree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(idx, _)| (self.graph[*idx].clone(), *idx))
            .collect();

        let mut order = Vec::new();
        while let Some((name, idx)) = ready.iter().next().cloned() {
            ready.remove(&(name.clone(), idx));
            order.push(name);
            for edge in self.graph.edges(idx) {
                let target = edge.target();
                let deg = in_degree.get_mut(&target).expect("every node has an in-degree entry");
                *deg -= 1;
                if *deg == 0 {
                    ready.insert((self.graph[target].clone(), target));
                }
            }
        }

        if order.len() == self.graph.node_count() {
            Ok(order)
        } else {
            Err(self.find_simple_cycles())
        }
    }

    /// Enumerates elementary cycles via a Johnson-style DFS: for each node
    /// `start` in lexicographic order, only follow nodes `>= start` so each
    /// cycle is discovered exactly once, from its lexicographically-least
    /// member.
    fn find_simple_cycles(&self) -> Vec<Cycle> {
        let mut names: Vec<&String> = self.index_of.keys().collect();
        names.sort();

        let mut cycles = Vec::new();
        for start_name in &names {
            let start = self.index_of[*start_name];
            let mut path = vec![start];
            let mut on_path = BTreeSet::new();
            on_path.insert(start);
            self.dfs_cycles(start, start, &mut path, &mut on_path, &mut cycles);
        }
        cycles
    }

    fn dfs_cycles(
        &self,
        start: NodeIndex,
        current: NodeIndex,
        path: &mut Vec<NodeIndex>,
        on_path: &mut BTreeSet<NodeIndex>,
        cycles: &mut Vec<Cycle>,
    ) {
        for edge in self.graph.edges(current) {
            let next = edge.target();
            if next == start && path.len() > 1 {
                let mut modules: Vec<String> = path.iter().map(|idx| self.graph[*idx].clone()).collect();
                modules.push(self.graph[start].clone());
                cycles.push(Cycle { modules });
                continue;
            }
            if next.index() < start.index() || on_path.contains(&next) {
                continue;
            }
            path.push(next);
            on_path.insert(next);
            self.dfs_cycles(start, next, path, on_path, cycles);
            on_path.remove(&next);
            path.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acyclic_graph_topologically_sorts_with_lexicographic_ties() {
        let mut graph = DependencyGraph::new();
        graph.add_module("z");
        graph.add_dependency("a", "b");
        graph.add_dependency("a", "c");

        let order = graph.topological_order().expect("acyclic");
        let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
        assert!(pos("b") < pos("a"));
        assert!(pos("c") < pos("a"));
    }

    #[test]
    fn two_module_cycle_is_detected() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "b");
        graph.add_dependency("b", "a");

        let cycles = graph.topological_order().unwrap_err();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].modules.first(), cycles[0].modules.last());
    }
}
