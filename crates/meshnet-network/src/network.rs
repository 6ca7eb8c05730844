//! The wired mesh network
//!
//! [`MeshNetwork`] owns the registry, connection store, topology graph,
//! discovery index, and router, and keeps them consistent across every
//! mutation: node/connection CRUD flows registry -> connections -> graph
//! -> discovery before the next processing tick can observe it.
//!
//! Processing is tick-driven. [`MeshNetwork::tick`] runs one intake and
//! one delivery batch synchronously (what deterministic tests drive);
//! [`MeshNetwork::start_workers`] spawns the same batches on fixed
//! intervals for free-running use.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use meshnet_core::{
    MeshError, MeshResult, MessageEnvelope, MessageId, NodeDirectory, NodeName, NodeProfile,
    NodeStatus, RegistryError, Signer, SimulationSigner,
};
use meshnet_discovery::{
    Announcement, DiscoveryIndex, SearchHit, SearchOptions, SearchQuery, announce,
};
use meshnet_routing::{MeshRouter, RouterConfig, RoutingStats};
use meshnet_topology::{ConnectivityAnalysis, TopologyGraph};

use crate::connection::{Connection, ConnectionStore, ConnectionType};
use crate::registry::{NodeRegistry, NodeSpec};

/// Router wired to the orchestrator's own structures
pub type NetworkRouter = MeshRouter<NodeRegistry, ConnectionStore, NodeRegistry>;

/// Intervals for the background workers
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub intake_interval: Duration,
    pub delivery_interval: Duration,
    pub cache_sweep_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            intake_interval: Duration::from_millis(100),
            delivery_interval: Duration::from_millis(100),
            cache_sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Aggregate figures included in topology snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkStats {
    pub nodes: usize,
    pub active_nodes: usize,
    pub connections: usize,
    pub edges: usize,
    pub routing: RoutingStats,
}

/// Everything a rendering layer needs in one consistent view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub nodes: Vec<NodeProfile>,
    pub connections: Vec<Connection>,
    pub adjacency: BTreeMap<NodeName, BTreeSet<NodeName>>,
    pub stats: NetworkStats,
}

/// The orchestrated mesh network
pub struct MeshNetwork {
    registry: Arc<NodeRegistry>,
    connections: Arc<ConnectionStore>,
    graph: Arc<RwLock<TopologyGraph>>,
    discovery: Arc<DiscoveryIndex>,
    router: Arc<NetworkRouter>,
    signer: Arc<dyn Signer>,
}

impl MeshNetwork {
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    pub fn with_config(router_config: RouterConfig) -> Self {
        let registry = Arc::new(NodeRegistry::new());
        let connections = Arc::new(ConnectionStore::new());
        let graph = Arc::new(RwLock::new(TopologyGraph::new()));
        let router = Arc::new(MeshRouter::with_config(
            registry.clone(),
            connections.clone(),
            registry.clone(),
            graph.clone(),
            router_config,
        ));
        Self {
            registry,
            connections,
            graph,
            discovery: Arc::new(DiscoveryIndex::new()),
            router,
            signer: Arc::new(SimulationSigner::new("meshnet-announce")),
        }
    }

    /// Swap in an external signing capability
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = signer;
        self
    }

    // ------------------------------------------------------------------
    // Node lifecycle
    // ------------------------------------------------------------------

    /// Register a node and make it visible to routing and discovery
    pub fn create_node(&self, name: &str, spec: NodeSpec) -> MeshResult<NodeProfile> {
        let name = NodeName::new(name).map_err(MeshError::from)?;
        let profile = self.registry.insert(name.clone(), spec)?;
        self.graph.write().unwrap().add_node(name);
        self.discovery.index(&profile);
        info!(node = %profile.name, node_type = %profile.node_type, "node created");
        Ok(profile)
    }

    /// Remove a node, cascading to connections, graph, and index
    ///
    /// Connections go first (the graph ordering invariant), then the
    /// graph drops the node and its edges under one write lock so no
    /// reader observes a half-cleaned adjacency. Removing an absent
    /// node is a no-op.
    pub fn remove_node(&self, name: &str) -> MeshResult<()> {
        let name = NodeName::new(name).map_err(MeshError::from)?;

        for closed in self.connections.remove_touching(&name) {
            if let Some(peer) = closed.peer_of(&name) {
                self.registry.adjust_connections(peer, -1);
            }
        }

        self.graph.write().unwrap().remove_node(&name);
        self.discovery.deindex(&name);
        if self.registry.remove(&name).is_some() {
            info!(node = %name, "node removed");
        }
        Ok(())
    }

    /// Flip a node between active and inactive (or shut it down)
    pub fn set_node_status(&self, name: &str, status: NodeStatus) -> MeshResult<()> {
        let name = NodeName::new(name).map_err(MeshError::from)?;
        self.registry.set_status(&name, status)?;
        self.reindex(&name);
        Ok(())
    }

    /// Update a node's trust score (clamped to 0..=100)
    pub fn set_node_trust(&self, name: &str, trust: i64) -> MeshResult<()> {
        let name = NodeName::new(name).map_err(MeshError::from)?;
        self.registry.set_trust(&name, trust)?;
        self.reindex(&name);
        Ok(())
    }

    fn reindex(&self, name: &NodeName) {
        if let Some(profile) = self.registry.profile(name) {
            self.discovery.index(&profile);
        }
    }

    // ------------------------------------------------------------------
    // Connection lifecycle
    // ------------------------------------------------------------------

    /// Link two registered nodes
    pub fn add_connection(&self, a: &str, b: &str) -> MeshResult<Connection> {
        self.add_connection_typed(a, b, ConnectionType::default())
    }

    pub fn add_connection_typed(
        &self,
        a: &str,
        b: &str,
        kind: ConnectionType,
    ) -> MeshResult<Connection> {
        let a = NodeName::new(a).map_err(MeshError::from)?;
        let b = NodeName::new(b).map_err(MeshError::from)?;
        for endpoint in [&a, &b] {
            if !self.registry.contains(endpoint) {
                return Err(meshnet_core::ConnectionError::UnknownEndpoint(
                    endpoint.to_string(),
                )
                .into());
            }
        }

        let before = self.connections.len();
        let connection = self.connections.add(&a, &b, kind)?;
        if self.connections.len() > before {
            self.graph.write().unwrap().add_edge(a.clone(), b.clone());
            self.registry.adjust_connections(&a, 1);
            self.registry.adjust_connections(&b, 1);
            self.reindex(&a);
            self.reindex(&b);
        }
        Ok(connection)
    }

    /// Unlink two nodes; a no-op if they were not linked
    pub fn remove_connection(&self, a: &str, b: &str) -> MeshResult<()> {
        let a = NodeName::new(a).map_err(MeshError::from)?;
        let b = NodeName::new(b).map_err(MeshError::from)?;

        if self.connections.remove(&a, &b).is_some() {
            self.graph.write().unwrap().remove_edge(&a, &b);
            self.registry.adjust_connections(&a, -1);
            self.registry.adjust_connections(&b, -1);
            self.reindex(&a);
            self.reindex(&b);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Messaging
    // ------------------------------------------------------------------

    /// Queue a message for routing; validation happens at intake
    pub fn submit_message(
        &self,
        source: &str,
        target: &str,
        payload: Vec<u8>,
    ) -> MeshResult<MessageId> {
        let source = NodeName::new(source).map_err(MeshError::from)?;
        let target = NodeName::new(target).map_err(MeshError::from)?;

        // Message counters track traffic entering a direct link
        self.connections.record_activity(&source, &target);

        let envelope = MessageEnvelope::new(source, target, payload);
        Ok(self.router.submit(envelope))
    }

    /// Run one intake batch and one delivery batch
    ///
    /// Returns (paths resolved, envelopes delivered). This is the
    /// deterministic entry point tests drive instead of wall-clock
    /// workers.
    pub async fn tick(&self) -> (usize, usize) {
        let resolved = self.router.process_intake();
        let delivered = self.router.process_delivery().await;
        (resolved, delivered)
    }

    /// Drive several ticks back to back
    pub async fn run_ticks(&self, ticks: usize) -> usize {
        let mut delivered = 0;
        for _ in 0..ticks {
            delivered += self.tick().await.1;
        }
        delivered
    }

    /// Spawn free-running intake/delivery/sweep workers
    ///
    /// Returns the join handles; abort them to stop processing.
    pub fn start_workers(&self, config: WorkerConfig) -> Vec<JoinHandle<()>> {
        let WorkerConfig {
            intake_interval,
            delivery_interval,
            cache_sweep_interval,
        } = config;

        let intake_router = self.router.clone();
        let intake = tokio::spawn(async move {
            let mut interval = tokio::time::interval(intake_interval);
            loop {
                interval.tick().await;
                intake_router.process_intake();
            }
        });

        let delivery_router = self.router.clone();
        let delivery = tokio::spawn(async move {
            let mut interval = tokio::time::interval(delivery_interval);
            loop {
                interval.tick().await;
                delivery_router.process_delivery().await;
            }
        });

        let discovery = self.discovery.clone();
        let sweep = tokio::spawn(async move {
            let mut interval = tokio::time::interval(cache_sweep_interval);
            loop {
                interval.tick().await;
                let (queries, snapshots) = discovery.sweep_caches();
                if queries + snapshots > 0 {
                    debug!(queries, snapshots, "cache sweep");
                }
            }
        });

        vec![intake, delivery, sweep]
    }

    // ------------------------------------------------------------------
    // Discovery
    // ------------------------------------------------------------------

    /// Search registered nodes
    pub fn search(
        &self,
        query: &SearchQuery,
        options: &SearchOptions,
    ) -> MeshResult<Vec<SearchHit>> {
        Ok(self
            .discovery
            .search(self.registry.as_ref(), query, options)?)
    }

    /// Cached direct lookup of one node
    pub fn node_snapshot(&self, name: &str) -> MeshResult<Option<NodeProfile>> {
        let name = NodeName::new(name).map_err(MeshError::from)?;
        Ok(self.discovery.node_snapshot(self.registry.as_ref(), &name))
    }

    /// Build a signed announcement for a node's current profile
    pub fn announce_node(&self, name: &str) -> MeshResult<Announcement> {
        let name = NodeName::new(name).map_err(MeshError::from)?;
        let profile = self
            .registry
            .profile(&name)
            .ok_or_else(|| RegistryError::UnknownNode(name.to_string()))?;
        Ok(announce(&profile, self.signer.as_ref())?)
    }

    // ------------------------------------------------------------------
    // Observability surfaces
    // ------------------------------------------------------------------

    /// One consistent view of nodes, connections, adjacency, and stats
    pub fn topology_snapshot(&self) -> TopologySnapshot {
        let nodes = self.registry.profiles();
        let adjacency = self.graph.read().unwrap().adjacency().clone();
        let stats = NetworkStats {
            nodes: nodes.len(),
            active_nodes: nodes
                .iter()
                .filter(|p| p.status == NodeStatus::Active)
                .count(),
            connections: self.connections.len(),
            edges: self.graph.read().unwrap().edge_count(),
            routing: self.router.stats(),
        };
        TopologySnapshot {
            nodes,
            connections: self.connections.all(),
            adjacency,
            stats,
        }
    }

    /// Graph analytics bundle (diameter, clustering, bottlenecks)
    pub fn connectivity_analysis(&self) -> ConnectivityAnalysis {
        self.graph.read().unwrap().analyze()
    }

    pub fn routing_stats(&self) -> RoutingStats {
        self.router.stats()
    }

    pub fn failed_messages(&self) -> Vec<meshnet_core::FailedMessage> {
        self.router.failed_messages()
    }

    /// Put an archived message back through intake with a fresh budget
    pub fn resubmit_failed(&self, id: &MessageId) -> Option<MessageId> {
        self.router.resubmit_failed(id)
    }

    /// Registry handle (inbox draining, direct profile reads)
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }
}

impl Default for MeshNetwork {
    fn default() -> Self {
        Self::new()
    }
}
