//! Scripted simulation scenarios
//!
//! Each scenario builds a topology through the orchestrator, submits
//! traffic, drives ticks deterministically, and reports what happened.

use anyhow::Result;
use tracing::info;

use meshnet_core::{Capability, CapabilitySet, NodeStatus, NodeType};
use meshnet_discovery::{SearchOptions, SearchQuery};
use meshnet_network::{MeshNetwork, NodeSpec};
use meshnet_topology::{TopologyBuilder, TopologyLayout};

fn router_spec(trust: i64) -> NodeSpec {
    NodeSpec {
        node_type: NodeType::Router,
        capabilities: CapabilitySet::new().with(Capability::Routing),
        trust_score: trust,
    }
}

/// Create nodes and connections from a layout
///
/// Every node gets the routing capability so multi-hop paths work out
/// of the box; scenarios degrade individual nodes afterwards.
fn populate(network: &MeshNetwork, layout: &TopologyLayout) -> Result<()> {
    for name in &layout.names {
        network.create_node(name.as_str(), router_spec(70))?;
    }
    for (a, b) in &layout.edges {
        network.add_connection(a.as_str(), b.as_str())?;
    }
    Ok(())
}

fn report_routing(network: &MeshNetwork) {
    let stats = network.routing_stats();
    info!(
        routed = stats.routed,
        delivered = stats.delivered,
        failed = stats.failed,
        forwarded = stats.forwarded,
        retried = stats.retried,
        avg_latency_ms = stats.average_latency_ms,
        "routing statistics"
    );
}

/// Relay a message end to end across a line
pub async fn run_relay_scenario(nodes: usize) -> Result<()> {
    let nodes = nodes.max(2);
    info!(nodes, "relay scenario: line topology");

    let network = MeshNetwork::new();
    let layout = TopologyBuilder::new(nodes).line();
    populate(&network, &layout)?;

    let source = layout.names.first().expect("line has nodes").clone();
    let target = layout.names.last().expect("line has nodes").clone();
    network.submit_message(source.as_str(), target.as_str(), b"across the line".to_vec())?;

    // One tick per hop plus slack
    network.run_ticks(nodes + 2).await;

    let inbox = network.registry().take_inbox(&target);
    match inbox.first() {
        Some(envelope) => info!(
            target = %target,
            forwards = envelope.forward_count,
            path = ?envelope.forward_path,
            "message arrived"
        ),
        None => info!(target = %target, "message did not arrive"),
    }

    report_routing(&network);
    Ok(())
}

/// Leaf-to-leaf traffic through a hub, then the analytics view
pub async fn run_star_scenario(nodes: usize) -> Result<()> {
    let nodes = nodes.max(3);
    info!(nodes, "star scenario: hub-and-spoke");

    let network = MeshNetwork::new();
    let layout = TopologyBuilder::new(nodes).star();
    populate(&network, &layout)?;

    // Every leaf greets the next one; all paths cross the hub
    let leaves = &layout.names[1..];
    for pair in leaves.windows(2) {
        network.submit_message(pair[0].as_str(), pair[1].as_str(), b"via hub".to_vec())?;
    }

    network.run_ticks(leaves.len() * 2 + 2).await;
    report_routing(&network);

    let analysis = network.connectivity_analysis();
    info!(
        diameter = analysis.diameter,
        clustering = analysis.clustering_coefficient,
        isolated = analysis.distribution.isolated,
        bottlenecks = ?analysis.bottlenecks,
        "connectivity analysis"
    );
    Ok(())
}

/// Force failures: reroute around a dead relay, then exhaust retries
pub async fn run_failure_scenario() -> Result<()> {
    info!("failure scenario: diamond with a dead relay, then a dead-end chain");

    let network = MeshNetwork::new();
    // Diamond src-upper-dst / src-lower-dst
    for name in ["src", "upper", "lower", "dst"] {
        network.create_node(name, router_spec(60))?;
    }
    network.add_connection("src", "upper")?;
    network.add_connection("src", "lower")?;
    network.add_connection("upper", "dst")?;
    network.add_connection("lower", "dst")?;

    // Kill the preferred relay; routing should fall back to the other arm
    network.set_node_status("lower", NodeStatus::Inactive)?;
    network.submit_message("src", "dst", b"around the hole".to_vec())?;
    network.run_ticks(5).await;
    info!(
        delivered = network.routing_stats().delivered,
        "diamond leg complete"
    );

    // A chain whose only relay is down: retries exhaust into the archive
    for name in ["island-a", "island-relay", "island-b"] {
        network.create_node(name, router_spec(60))?;
    }
    network.add_connection("island-a", "island-relay")?;
    network.add_connection("island-relay", "island-b")?;
    network.set_node_status("island-relay", NodeStatus::Inactive)?;

    let id = network.submit_message("island-a", "island-b", b"stuck".to_vec())?;
    network.run_ticks(6).await;

    let failed = network.failed_messages();
    info!(archived = failed.len(), "failed archive after retries");

    // Operator fixes the relay and resubmits from the archive
    network.set_node_status("island-relay", NodeStatus::Active)?;
    if network.resubmit_failed(&id).is_some() {
        network.run_ticks(4).await;
        info!(
            delivered = network.registry().inbox_len(
                &meshnet_core::NodeName::new("island-b")?
            ),
            "resubmission outcome"
        );
    }

    report_routing(&network);
    Ok(())
}

/// Build a layout and print its analytics
pub fn run_topology_report(kind: &str, nodes: usize, connection_prob: f64) -> Result<()> {
    let builder = TopologyBuilder::new(nodes.max(2));
    let layout = match kind {
        "ring" => builder.ring(),
        "full" => builder.full_mesh(),
        "random" => builder.random(connection_prob),
        "line" => builder.line(),
        "star" => builder.star(),
        other => {
            info!(topology = other, "unknown topology, using ring");
            builder.ring()
        }
    };

    let graph = layout.into_graph();
    let analysis = graph.analyze();
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        diameter = analysis.diameter,
        clustering = analysis.clustering_coefficient,
        isolated = analysis.distribution.isolated,
        highly_connected = analysis.distribution.highly_connected,
        bottlenecks = ?analysis.bottlenecks,
        "topology report"
    );
    for (degree, count) in &analysis.distribution.histogram {
        info!(degree = *degree, count = *count, "degree histogram");
    }
    Ok(())
}

/// Populate a mixed mesh and run discovery searches
pub async fn run_discovery_scenario(nodes: usize) -> Result<()> {
    let nodes = nodes.max(4);
    info!(nodes, "discovery scenario");

    let network = MeshNetwork::new();
    let layout = TopologyBuilder::new(nodes).ring();

    for (i, name) in layout.names.iter().enumerate() {
        let spec = match i % 4 {
            0 => NodeSpec {
                node_type: NodeType::Gateway,
                capabilities: CapabilitySet::new().with(Capability::Gateway),
                trust_score: 90,
            },
            1 => router_spec(70),
            2 => NodeSpec {
                node_type: NodeType::Sensor,
                capabilities: CapabilitySet::new().with(Capability::Sensor),
                trust_score: 40,
            },
            _ => NodeSpec::default(),
        };
        network.create_node(name.as_str(), spec)?;
    }
    for (a, b) in &layout.edges {
        network.add_connection(a.as_str(), b.as_str())?;
    }

    let gateways = network.search(
        &SearchQuery {
            node_type: Some(NodeType::Gateway),
            ..Default::default()
        },
        &SearchOptions::default(),
    )?;
    info!(hits = gateways.len(), "gateway search");
    for hit in &gateways {
        info!(
            node = %hit.profile.name,
            relevance = hit.relevance,
            trust = hit.profile.trust_score,
            "gateway"
        );
    }

    let routers = network.search(
        &SearchQuery {
            capability: Some("routing".to_string()),
            min_trust: Some(50),
            ..Default::default()
        },
        &SearchOptions::default(),
    )?;
    info!(hits = routers.len(), "trusted routing-capable search");

    // Repeat the gateway search to show the cache at work
    network.search(
        &SearchQuery {
            node_type: Some(NodeType::Gateway),
            ..Default::default()
        },
        &SearchOptions::default(),
    )?;

    let announcement = network.announce_node(layout.names[0].as_str())?;
    info!(
        node = %announcement.node,
        signature_bytes = announcement.signature.len(),
        "signed announcement built"
    );

    Ok(())
}
