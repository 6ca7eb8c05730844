//! End-to-end lifecycle tests across the full stack
//!
//! These drive the orchestrator exactly the way the CLI/API layer would:
//! CRUD operations, message submission, deterministic ticks, and the
//! observability surfaces.

use meshnet_core::{
    Capability, CapabilitySet, NodeDirectory, NodeName, NodeStatus, NodeType, RouteError,
};
use meshnet_discovery::{SearchOptions, SearchQuery, SortKey};
use meshnet_network::{MeshNetwork, NodeSpec};
use meshnet_topology::TopologyBuilder;

fn name(s: &str) -> NodeName {
    NodeName::new(s).unwrap()
}

fn router_spec(trust: i64) -> NodeSpec {
    NodeSpec {
        node_type: NodeType::Router,
        capabilities: CapabilitySet::new().with(Capability::Routing),
        trust_score: trust,
    }
}

/// Build a network from a layout with every node routing-capable
fn network_from_layout(layout: &meshnet_topology::TopologyLayout) -> MeshNetwork {
    let network = MeshNetwork::new();
    for node in &layout.names {
        network.create_node(node.as_str(), router_spec(70)).unwrap();
    }
    for (a, b) in &layout.edges {
        network.add_connection(a.as_str(), b.as_str()).unwrap();
    }
    network
}

#[tokio::test]
async fn test_ring_traffic_all_delivered() {
    let layout = TopologyBuilder::new(6).ring();
    let network = network_from_layout(&layout);

    // Every node messages the node two hops ahead
    let count = layout.names.len();
    for i in 0..count {
        let from = &layout.names[i];
        let to = &layout.names[(i + 2) % count];
        network
            .submit_message(from.as_str(), to.as_str(), b"ring".to_vec())
            .unwrap();
    }

    network.run_ticks(20).await;

    let stats = network.routing_stats();
    assert_eq!(stats.routed, count as u64);
    assert_eq!(stats.delivered, count as u64);
    assert_eq!(stats.failed, 0);
    assert!(network.failed_messages().is_empty());
}

#[tokio::test]
async fn test_node_removal_cascade_breaks_routing() {
    // a - b - c: removing b strands the endpoints
    let network = MeshNetwork::new();
    network.create_node("a", NodeSpec::default()).unwrap();
    network.create_node("b", router_spec(70)).unwrap();
    network.create_node("c", NodeSpec::default()).unwrap();
    network.add_connection("a", "b").unwrap();
    network.add_connection("b", "c").unwrap();

    network.remove_node("b").unwrap();

    // Connections referencing b are gone and the adjacency is clean
    let snapshot = network.topology_snapshot();
    assert_eq!(snapshot.stats.connections, 0);
    assert!(!snapshot.adjacency.contains_key(&name("b")));
    assert!(snapshot.adjacency[&name("a")].is_empty());

    // A message between the stranded endpoints is rejected with no route
    network.submit_message("a", "c", vec![]).unwrap();
    network.tick().await;

    let failed = network.failed_messages();
    assert_eq!(failed.len(), 1);
    assert!(matches!(failed[0].error, RouteError::NoRoute { .. }));
}

#[tokio::test]
async fn test_retry_exhaustion_archives_exactly_once() {
    let network = MeshNetwork::new();
    network.create_node("src", NodeSpec::default()).unwrap();
    // The only relay lacks the routing capability
    network.create_node("mid", NodeSpec::default()).unwrap();
    network.create_node("dst", NodeSpec::default()).unwrap();
    network.add_connection("src", "mid").unwrap();
    network.add_connection("mid", "dst").unwrap();

    network.submit_message("src", "dst", vec![]).unwrap();
    network.run_ticks(6).await;

    let failed = network.failed_messages();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].attempts, 3);
    assert_eq!(network.routing_stats().failed, 1);

    // Enabling routing on the relay and resubmitting completes delivery
    let id = failed[0].envelope.id;
    let profile = network.registry().profile(&name("mid")).unwrap();
    assert!(!profile.capabilities.has(Capability::Routing));

    network.remove_node("mid").unwrap();
    network.create_node("mid", router_spec(70)).unwrap();
    network.add_connection("src", "mid").unwrap();
    network.add_connection("mid", "dst").unwrap();

    network.resubmit_failed(&id).unwrap();
    network.run_ticks(4).await;

    assert_eq!(network.registry().inbox_len(&name("dst")), 1);
    assert!(network.failed_messages().is_empty());
}

#[tokio::test]
async fn test_status_flip_affects_forwarding() {
    let network = MeshNetwork::new();
    network.create_node("a", NodeSpec::default()).unwrap();
    network.create_node("relay", router_spec(70)).unwrap();
    network.create_node("b", NodeSpec::default()).unwrap();
    network.add_connection("a", "relay").unwrap();
    network.add_connection("relay", "b").unwrap();

    network
        .set_node_status("relay", NodeStatus::Inactive)
        .unwrap();
    network.submit_message("a", "b", vec![]).unwrap();
    network.run_ticks(6).await;
    assert_eq!(network.routing_stats().delivered, 0);
    assert_eq!(network.failed_messages().len(), 1);

    network.set_node_status("relay", NodeStatus::Active).unwrap();
    network.submit_message("a", "b", vec![]).unwrap();
    network.run_ticks(4).await;
    assert_eq!(network.routing_stats().delivered, 1);
}

#[test]
fn test_search_over_live_registry() {
    let network = MeshNetwork::new();
    network
        .create_node(
            "edge-gateway",
            NodeSpec {
                node_type: NodeType::Gateway,
                capabilities: CapabilitySet::new().with(Capability::Gateway),
                trust_score: 95,
            },
        )
        .unwrap();
    network.create_node("relay-1", router_spec(60)).unwrap();
    network.create_node("relay-2", router_spec(20)).unwrap();
    network
        .create_node("sensor-1", NodeSpec::with_type(NodeType::Sensor))
        .unwrap();

    // Trusted routing-capable nodes only
    let hits = network
        .search(
            &SearchQuery {
                capability: Some("routing".to_string()),
                min_trust: Some(50),
                ..Default::default()
            },
            &SearchOptions::default(),
        )
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].profile.name.as_str(), "relay-1");

    // Sort override by name
    let hits = network
        .search(
            &SearchQuery::default(),
            &SearchOptions {
                sort: SortKey::Name,
                ..Default::default()
            },
        )
        .unwrap();
    let names: Vec<&str> = hits.iter().map(|h| h.profile.name.as_str()).collect();
    assert_eq!(names, vec!["edge-gateway", "relay-1", "relay-2", "sensor-1"]);

    // Connection-count post-filter drops the unconnected mesh
    let hits = network
        .search(
            &SearchQuery::default(),
            &SearchOptions {
                min_connections: Some(1),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_snapshot_reflects_full_state() {
    let layout = TopologyBuilder::new(4).full_mesh();
    let network = network_from_layout(&layout);

    network
        .submit_message("node-1", "node-3", b"x".to_vec())
        .unwrap();
    network.run_ticks(2).await;

    let snapshot = network.topology_snapshot();
    assert_eq!(snapshot.stats.nodes, 4);
    assert_eq!(snapshot.stats.active_nodes, 4);
    assert_eq!(snapshot.stats.connections, 6);
    assert_eq!(snapshot.stats.edges, 6);
    assert_eq!(snapshot.stats.routing.delivered, 1);
    assert_eq!(snapshot.nodes.len(), 4);
    assert_eq!(snapshot.connections.len(), 6);

    // Adjacency in the snapshot matches the graph's symmetry invariant
    for (node, neighbors) in &snapshot.adjacency {
        for neighbor in neighbors {
            assert!(snapshot.adjacency[neighbor].contains(node));
        }
    }
}
