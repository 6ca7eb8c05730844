//! # Meshnet Topology
//!
//! Maintains the undirected adjacency structure over node names and
//! derives connectivity metrics from it:
//!
//! - [`TopologyGraph`]: symmetric adjacency with BFS shortest paths
//! - Analytics: diameter, clustering coefficient, degree distribution,
//!   bottleneck detection
//! - [`TopologyBuilder`]: ring / line / star / full-mesh / random layouts
//!
//! The analytics are sized for simulated networks (tens to low hundreds
//! of nodes); see the individual methods for the cost notes.

pub mod graph;
pub mod analytics;
pub mod builder;

pub use graph::*;
pub use analytics::*;
pub use builder::*;
