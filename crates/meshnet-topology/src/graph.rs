//! Symmetric adjacency structure over node names

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::trace;

use meshnet_core::NodeName;

/// Undirected adjacency structure over node names
///
/// Invariant: adjacency is symmetric (if A lists B then B lists A).
/// Ordered maps keep neighbor iteration deterministic, so BFS resolves
/// equal-length path ties to the lexicographically smallest route.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyGraph {
    adjacency: BTreeMap<NodeName, BTreeSet<NodeName>>,
}

impl TopologyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node with no edges; no-op if already present
    pub fn add_node(&mut self, name: NodeName) {
        self.adjacency.entry(name).or_default();
    }

    /// Remove a node and every edge touching it; no-op if absent
    ///
    /// The caller removes the corresponding connection records first;
    /// this only maintains the adjacency structure.
    pub fn remove_node(&mut self, name: &NodeName) {
        if let Some(neighbors) = self.adjacency.remove(name) {
            for neighbor in neighbors {
                if let Some(set) = self.adjacency.get_mut(&neighbor) {
                    set.remove(name);
                }
            }
            trace!(node = %name, "removed from topology");
        }
    }

    /// Insert a symmetric edge; idempotent, self-loops ignored
    pub fn add_edge(&mut self, a: NodeName, b: NodeName) {
        if a == b {
            return;
        }
        self.adjacency.entry(a.clone()).or_default().insert(b.clone());
        self.adjacency.entry(b).or_default().insert(a);
    }

    /// Remove a symmetric edge; idempotent
    pub fn remove_edge(&mut self, a: &NodeName, b: &NodeName) {
        if let Some(set) = self.adjacency.get_mut(a) {
            set.remove(b);
        }
        if let Some(set) = self.adjacency.get_mut(b) {
            set.remove(a);
        }
    }

    /// Check whether a node is present
    pub fn contains(&self, name: &NodeName) -> bool {
        self.adjacency.contains_key(name)
    }

    /// Check whether two nodes share an edge
    pub fn are_connected(&self, a: &NodeName, b: &NodeName) -> bool {
        self.adjacency
            .get(a)
            .map(|neighbors| neighbors.contains(b))
            .unwrap_or(false)
    }

    /// Neighbors of a node
    pub fn neighbors(&self, name: &NodeName) -> Option<&BTreeSet<NodeName>> {
        self.adjacency.get(name)
    }

    /// Degree of a node (0 for unknown nodes)
    pub fn degree(&self, name: &NodeName) -> usize {
        self.adjacency.get(name).map(BTreeSet::len).unwrap_or(0)
    }

    /// Common neighbors of two nodes
    pub fn mutual_neighbors(&self, a: &NodeName, b: &NodeName) -> BTreeSet<NodeName> {
        match (self.adjacency.get(a), self.adjacency.get(b)) {
            (Some(an), Some(bn)) => an.intersection(bn).cloned().collect(),
            _ => BTreeSet::new(),
        }
    }

    /// All node names
    pub fn names(&self) -> Vec<NodeName> {
        self.adjacency.keys().cloned().collect()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Iterate the adjacency map (for snapshots)
    pub fn adjacency(&self) -> &BTreeMap<NodeName, BTreeSet<NodeName>> {
        &self.adjacency
    }

    /// Shortest path between two nodes, endpoints inclusive
    ///
    /// Breadth-first search over unweighted edges. Returns `None` when
    /// either endpoint is unknown or no path exists. Among equal-length
    /// paths the lexicographically smallest is returned (a consequence
    /// of the ordered neighbor sets, relied upon by tests).
    pub fn shortest_path(&self, from: &NodeName, to: &NodeName) -> Option<Vec<NodeName>> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        if from == to {
            return Some(vec![from.clone()]);
        }

        let mut predecessor: BTreeMap<&NodeName, &NodeName> = BTreeMap::new();
        let mut visited: BTreeSet<&NodeName> = BTreeSet::new();
        let mut frontier: VecDeque<&NodeName> = VecDeque::new();

        visited.insert(from);
        frontier.push_back(from);

        while let Some(current) = frontier.pop_front() {
            for neighbor in &self.adjacency[current] {
                if !visited.insert(neighbor) {
                    continue;
                }
                predecessor.insert(neighbor, current);
                if neighbor == to {
                    let mut path = vec![to.clone()];
                    let mut cursor = to;
                    while let Some(&prev) = predecessor.get(cursor) {
                        path.push(prev.clone());
                        cursor = prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                frontier.push_back(neighbor);
            }
        }
        None
    }

    /// Whether every node can reach every other node
    ///
    /// Vacuously true for zero or one node.
    pub fn is_fully_connected(&self) -> bool {
        let Some(start) = self.adjacency.keys().next() else {
            return true;
        };
        self.reachable_from(start, None) == self.node_count()
    }

    /// Count nodes reachable from `start`, optionally treating one node
    /// as edgeless (the bottleneck removal probe)
    pub(crate) fn reachable_from(&self, start: &NodeName, excluded: Option<&NodeName>) -> usize {
        let mut visited: BTreeSet<&NodeName> = BTreeSet::new();
        let mut frontier: VecDeque<&NodeName> = VecDeque::new();
        visited.insert(start);
        frontier.push_back(start);

        while let Some(current) = frontier.pop_front() {
            for neighbor in &self.adjacency[current] {
                if Some(neighbor) == excluded {
                    continue;
                }
                if visited.insert(neighbor) {
                    frontier.push_back(neighbor);
                }
            }
        }
        visited.len()
    }
}
