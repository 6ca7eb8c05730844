//! Mesh layout builders
//!
//! Produce the standard simulation topologies:
//! - Ring: each node connected to its neighbors, wrapping around
//! - Line: a simple chain
//! - Star: first node is the hub
//! - Full mesh: every node connected to every other
//! - Random: configurable connection probability

use rand::Rng;

use meshnet_core::NodeName;

use crate::graph::TopologyGraph;

/// A generated layout: the node set plus the edge list
///
/// Kept separate from [`TopologyGraph`] so the orchestrator can create
/// registry entries and connection records from the same layout.
#[derive(Debug, Clone)]
pub struct TopologyLayout {
    pub names: Vec<NodeName>,
    pub edges: Vec<(NodeName, NodeName)>,
}

impl TopologyLayout {
    /// Materialize the layout as an adjacency graph
    pub fn into_graph(self) -> TopologyGraph {
        let mut graph = TopologyGraph::new();
        for name in self.names {
            graph.add_node(name);
        }
        for (a, b) in self.edges {
            graph.add_edge(a, b);
        }
        graph
    }
}

/// Builder for the standard layouts
pub struct TopologyBuilder {
    node_count: usize,
}

impl TopologyBuilder {
    /// Create a builder for `node_count` nodes named `node-1..node-N`
    pub fn new(node_count: usize) -> Self {
        Self { node_count }
    }

    fn names(&self) -> Vec<NodeName> {
        (1..=self.node_count)
            .map(|i| NodeName::new(format!("node-{i}")).expect("generated names are valid"))
            .collect()
    }

    /// Ring: node-1 - node-2 - ... - node-N - node-1
    pub fn ring(self) -> TopologyLayout {
        let names = self.names();
        let edges = (0..names.len())
            .map(|i| (names[i].clone(), names[(i + 1) % names.len()].clone()))
            .collect();
        TopologyLayout { names, edges }
    }

    /// Line: node-1 - node-2 - ... - node-N
    pub fn line(self) -> TopologyLayout {
        let names = self.names();
        let edges = names.windows(2).map(|w| (w[0].clone(), w[1].clone())).collect();
        TopologyLayout { names, edges }
    }

    /// Star: node-1 in the center, connected to all others
    pub fn star(self) -> TopologyLayout {
        let names = self.names();
        let edges = names
            .iter()
            .skip(1)
            .map(|leaf| (names[0].clone(), leaf.clone()))
            .collect();
        TopologyLayout { names, edges }
    }

    /// Full mesh: every node connected to every other
    pub fn full_mesh(self) -> TopologyLayout {
        let names = self.names();
        let mut edges = Vec::new();
        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                edges.push((names[i].clone(), names[j].clone()));
            }
        }
        TopologyLayout { names, edges }
    }

    /// Random layout with the given connection probability
    ///
    /// Isolated nodes get one extra edge so the layout starts usable.
    pub fn random(self, connection_probability: f64) -> TopologyLayout {
        let names = self.names();
        let mut rng = rand::rng();
        let mut edges: Vec<(NodeName, NodeName)> = Vec::new();

        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                if rng.random::<f64>() < connection_probability {
                    edges.push((names[i].clone(), names[j].clone()));
                }
            }
        }

        for (i, name) in names.iter().enumerate() {
            let connected = edges.iter().any(|(a, b)| a == name || b == name);
            if !connected && names.len() > 1 {
                let other = if i == 0 { 1 } else { i - 1 };
                edges.push((name.clone(), names[other].clone()));
            }
        }

        TopologyLayout { names, edges }
    }
}

/// Build a graph from a plain edge list (test and scenario convenience)
pub fn from_edges(edges: &[(&str, &str)]) -> TopologyGraph {
    let mut graph = TopologyGraph::new();
    for (a, b) in edges {
        let a = NodeName::new(*a).expect("valid edge endpoint");
        let b = NodeName::new(*b).expect("valid edge endpoint");
        graph.add_edge(a, b);
    }
    graph
}
