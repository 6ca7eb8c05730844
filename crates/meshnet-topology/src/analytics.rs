//! Connectivity metrics derived from the adjacency structure
//!
//! All-pairs and per-node probes here are O(n³) and O(n)·O(n²)
//! respectively. That is acceptable for the simulated scale this stack
//! targets (tens to low hundreds of nodes) and documented as such; they
//! are not general-purpose graph algorithms.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use meshnet_core::NodeName;

use crate::graph::TopologyGraph;

/// Degree at or above which a node counts as highly connected
pub const HIGHLY_CONNECTED_DEGREE: usize = 5;

/// Histogram of node degrees plus the tail counts operators care about
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DegreeDistribution {
    /// degree -> number of nodes with that degree
    pub histogram: BTreeMap<usize, usize>,
    /// Nodes with no edges at all
    pub isolated: usize,
    /// Nodes with degree >= [`HIGHLY_CONNECTED_DEGREE`]
    pub highly_connected: usize,
}

/// Aggregate connectivity report for observability surfaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityAnalysis {
    pub diameter: usize,
    pub clustering_coefficient: f64,
    pub distribution: DegreeDistribution,
    pub bottlenecks: Vec<NodeName>,
}

impl TopologyGraph {
    /// Network diameter: the longest shortest path, in hops
    ///
    /// Computed with Floyd–Warshall over the full node set. Unreachable
    /// pairs are excluded rather than treated as infinite; a graph with
    /// at most one node or no edges has diameter 0.
    pub fn diameter(&self) -> usize {
        let names = self.names();
        let n = names.len();
        if n <= 1 || self.edge_count() == 0 {
            return 0;
        }

        const UNREACHABLE: usize = usize::MAX / 2;
        let index: BTreeMap<&NodeName, usize> =
            names.iter().enumerate().map(|(i, name)| (name, i)).collect();

        let mut dist = vec![vec![UNREACHABLE; n]; n];
        for (i, row) in dist.iter_mut().enumerate() {
            row[i] = 0;
            if let Some(neighbors) = self.neighbors(&names[i]) {
                for neighbor in neighbors {
                    row[index[neighbor]] = 1;
                }
            }
        }

        for k in 0..n {
            for i in 0..n {
                for j in 0..n {
                    let through = dist[i][k] + dist[k][j];
                    if through < dist[i][j] {
                        dist[i][j] = through;
                    }
                }
            }
        }

        dist.iter()
            .flatten()
            .filter(|&&d| d < UNREACHABLE)
            .copied()
            .max()
            .unwrap_or(0)
    }

    /// Local clustering coefficient of one node
    ///
    /// `2 * triangles / (deg * (deg - 1))`, or `None` for degree < 2.
    pub fn local_clustering(&self, name: &NodeName) -> Option<f64> {
        let neighbors = self.neighbors(name)?;
        let degree = neighbors.len();
        if degree < 2 {
            return None;
        }

        let neighbor_list: Vec<&NodeName> = neighbors.iter().collect();
        let mut closed = 0usize;
        for (i, a) in neighbor_list.iter().enumerate() {
            for b in &neighbor_list[i + 1..] {
                if self.are_connected(a, b) {
                    closed += 1;
                }
            }
        }
        Some(2.0 * closed as f64 / (degree * (degree - 1)) as f64)
    }

    /// Network clustering coefficient
    ///
    /// Arithmetic mean of the local coefficients over nodes with degree
    /// >= 2. Nodes below that degree are excluded from the average
    /// entirely, not counted as zero. Returns 0.0 when no node qualifies.
    pub fn clustering_coefficient(&self) -> f64 {
        let locals: Vec<f64> = self
            .names()
            .iter()
            .filter_map(|name| self.local_clustering(name))
            .collect();
        if locals.is_empty() {
            return 0.0;
        }
        locals.iter().sum::<f64>() / locals.len() as f64
    }

    /// Degree histogram with isolated and highly-connected counts
    pub fn connectivity_distribution(&self) -> DegreeDistribution {
        let mut distribution = DegreeDistribution::default();
        for name in self.names() {
            let degree = self.degree(&name);
            *distribution.histogram.entry(degree).or_insert(0) += 1;
            if degree == 0 {
                distribution.isolated += 1;
            }
            if degree >= HIGHLY_CONNECTED_DEGREE {
                distribution.highly_connected += 1;
            }
        }
        distribution
    }

    /// Nodes whose removal disconnects the remaining graph
    ///
    /// For each node the probe treats its adjacency as cleared and
    /// re-tests whether every other node can still reach every other.
    /// One or zero remaining nodes count as connected. The probe is
    /// O(n) removals times an O(n²) reachability walk.
    pub fn bottlenecks(&self) -> Vec<NodeName> {
        let names = self.names();
        if names.len() <= 2 {
            return Vec::new();
        }

        names
            .iter()
            .filter(|&candidate| {
                let Some(start) = names.iter().find(|&n| n != candidate) else {
                    return false;
                };
                self.reachable_from(start, Some(candidate)) < names.len() - 1
            })
            .cloned()
            .collect()
    }

    /// Full analytics bundle for the observability surface
    pub fn analyze(&self) -> ConnectivityAnalysis {
        ConnectivityAnalysis {
            diameter: self.diameter(),
            clustering_coefficient: self.clustering_coefficient(),
            distribution: self.connectivity_distribution(),
            bottlenecks: self.bottlenecks(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{TopologyBuilder, from_edges};
    use meshnet_core::NodeName;

    fn name(s: &str) -> NodeName {
        NodeName::new(s).unwrap()
    }

    #[test]
    fn test_empty_graph_metrics() {
        let graph = TopologyGraph::new();
        assert_eq!(graph.diameter(), 0);
        assert_eq!(graph.clustering_coefficient(), 0.0);
        assert!(graph.bottlenecks().is_empty());
    }

    #[test]
    fn test_single_node_diameter_zero() {
        let mut graph = TopologyGraph::new();
        graph.add_node(name("only"));
        assert_eq!(graph.diameter(), 0);
    }

    #[test]
    fn test_star_metrics() {
        // Hub plus four leaves
        let graph = TopologyBuilder::new(5).star().into_graph();

        assert_eq!(graph.diameter(), 2);
        assert_eq!(graph.clustering_coefficient(), 0.0);

        let bottlenecks = graph.bottlenecks();
        assert_eq!(bottlenecks.len(), 1);
        // The hub is the first generated node
        assert_eq!(bottlenecks[0].as_str(), "node-1");
    }

    #[test]
    fn test_triangle_clustering_is_one() {
        let graph = from_edges(&[("a", "b"), ("b", "c"), ("a", "c")]);
        for node in ["a", "b", "c"] {
            assert_eq!(graph.local_clustering(&name(node)), Some(1.0));
        }
        assert_eq!(graph.clustering_coefficient(), 1.0);
    }

    #[test]
    fn test_low_degree_nodes_excluded_from_clustering() {
        // Triangle plus a pendant: the pendant (degree 1) must not drag
        // the average down
        let graph = from_edges(&[("a", "b"), ("b", "c"), ("a", "c"), ("c", "d")]);
        let coefficient = graph.clustering_coefficient();
        // a and b stay at 1.0, c drops to 1/3, d is excluded
        let expected = (1.0 + 1.0 + 1.0 / 3.0) / 3.0;
        assert!((coefficient - expected).abs() < 1e-9);
    }

    #[test]
    fn test_unreachable_pairs_excluded_from_diameter() {
        // Two disjoint components: diameter is the longest finite path
        let graph = from_edges(&[("a", "b"), ("b", "c"), ("x", "y")]);
        assert_eq!(graph.diameter(), 2);
    }

    #[test]
    fn test_degree_distribution() {
        let mut graph = from_edges(&[("hub", "l1"), ("hub", "l2"), ("hub", "l3"), ("hub", "l4"), ("hub", "l5")]);
        graph.add_node(name("loner"));

        let distribution = graph.connectivity_distribution();
        assert_eq!(distribution.isolated, 1);
        assert_eq!(distribution.highly_connected, 1);
        assert_eq!(distribution.histogram[&1], 5);
        assert_eq!(distribution.histogram[&5], 1);
        assert_eq!(distribution.histogram[&0], 1);
    }

    #[test]
    fn test_chain_bottlenecks() {
        // In a chain a-b-c-d the interior nodes are bottlenecks
        let graph = from_edges(&[("a", "b"), ("b", "c"), ("c", "d")]);
        let bottlenecks = graph.bottlenecks();
        assert_eq!(bottlenecks, vec![name("b"), name("c")]);
    }

    #[test]
    fn test_ring_has_no_bottlenecks() {
        let graph = TopologyBuilder::new(6).ring().into_graph();
        assert!(graph.bottlenecks().is_empty());
    }

    #[test]
    fn test_two_node_graph_has_no_bottlenecks() {
        let graph = from_edges(&[("a", "b")]);
        assert!(graph.bottlenecks().is_empty());
    }
}
