//! Hop-by-hop message router
//!
//! [`MeshRouter`] accepts envelopes into an unbounded FIFO intake queue,
//! resolves paths in bounded batches, and drives delivery tasks one hop
//! per pass. Path resolution order:
//!
//! 1. **Direct**: source and target share an edge
//! 2. **Graph**: BFS shortest path over the topology graph
//! 3. **Fallback**: breadth-first search over live connection records,
//!    covering links not yet reflected in the graph
//!
//! `UnknownNode` and `NoRoute` at intake are terminal: nothing about
//! graph membership can change within the same tick budget, so the
//! envelope is archived immediately. Failures during delivery consume
//! one retry attempt each until the budget is exhausted.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use tracing::{debug, trace, warn};

use meshnet_core::{
    DeliveryStatus, DenialReason, FailedMessage, LinkView, MessageEnvelope, MessageId,
    MessageSink, NodeDirectory, NodeName, NodeStatus, RouteError, Capability,
};
use meshnet_topology::TopologyGraph;

use crate::archive::{DEFAULT_ARCHIVE_CAPACITY, FailedArchive};
use crate::stats::RoutingStats;
use crate::task::DeliveryTask;

/// Tuning knobs for the routing pipeline
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Envelopes path-resolved per intake pass
    pub intake_batch: usize,
    /// Tasks moved per delivery pass
    pub delivery_batch: usize,
    /// Retry budget per envelope
    pub max_attempts: u32,
    /// Failed archive capacity
    pub failed_capacity: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            intake_batch: 5,
            delivery_batch: 3,
            max_attempts: 3,
            failed_capacity: DEFAULT_ARCHIVE_CAPACITY,
        }
    }
}

/// Outcome of moving one task one hop
enum StepOutcome {
    Delivered,
    Advanced,
    Failed(RouteError),
}

/// The routing pipeline
///
/// Generic over the registry view, the connection-record view, and the
/// delivery sink so the pipeline can be driven against test doubles.
pub struct MeshRouter<D, L, S>
where
    D: NodeDirectory,
    L: LinkView,
    S: MessageSink,
{
    directory: Arc<D>,
    links: Arc<L>,
    sink: Arc<S>,
    graph: Arc<RwLock<TopologyGraph>>,
    intake: Mutex<VecDeque<MessageEnvelope>>,
    delivery: Mutex<VecDeque<DeliveryTask>>,
    archive: FailedArchive,
    stats: Mutex<RoutingStats>,
    config: RouterConfig,
}

impl<D, L, S> MeshRouter<D, L, S>
where
    D: NodeDirectory,
    L: LinkView,
    S: MessageSink,
{
    pub fn new(
        directory: Arc<D>,
        links: Arc<L>,
        sink: Arc<S>,
        graph: Arc<RwLock<TopologyGraph>>,
    ) -> Self {
        Self::with_config(directory, links, sink, graph, RouterConfig::default())
    }

    pub fn with_config(
        directory: Arc<D>,
        links: Arc<L>,
        sink: Arc<S>,
        graph: Arc<RwLock<TopologyGraph>>,
        config: RouterConfig,
    ) -> Self {
        Self {
            directory,
            links,
            sink,
            graph,
            intake: Mutex::new(VecDeque::new()),
            delivery: Mutex::new(VecDeque::new()),
            archive: FailedArchive::new(config.failed_capacity),
            stats: Mutex::new(RoutingStats::default()),
            config,
        }
    }

    /// Accept an envelope into the intake queue
    pub fn submit(&self, envelope: MessageEnvelope) -> MessageId {
        let id = envelope.id;
        debug!(
            message_id = %id,
            source = %envelope.source,
            target = %envelope.target,
            "message queued for routing"
        );
        self.intake.lock().unwrap().push_back(envelope);
        self.stats.lock().unwrap().routed += 1;
        id
    }

    /// Resolve paths for one intake batch; returns tasks enqueued
    pub fn process_intake(&self) -> usize {
        let batch: Vec<MessageEnvelope> = {
            let mut intake = self.intake.lock().unwrap();
            let take = self.config.intake_batch.min(intake.len());
            intake.drain(..take).collect()
        };

        let mut resolved = 0;
        for envelope in batch {
            match self.resolve_path(&envelope) {
                Ok(path) => {
                    trace!(
                        message_id = %envelope.id,
                        hops = path.len(),
                        "path resolved"
                    );
                    let task = DeliveryTask::new(envelope, path);
                    self.delivery.lock().unwrap().push_back(task);
                    resolved += 1;
                }
                // Terminal at intake: no retry can change graph membership
                // within the same tick budget
                Err(error) => self.archive_failure(envelope, error),
            }
        }
        resolved
    }

    /// Move one delivery batch; returns envelopes delivered
    pub async fn process_delivery(&self) -> usize {
        let batch: Vec<DeliveryTask> = {
            let mut delivery = self.delivery.lock().unwrap();
            let take = self.config.delivery_batch.min(delivery.len());
            delivery.drain(..take).collect()
        };

        let mut delivered = 0;
        for mut task in batch {
            match self.step_task(&mut task).await {
                StepOutcome::Delivered => delivered += 1,
                StepOutcome::Advanced => {
                    self.delivery.lock().unwrap().push_back(task);
                }
                StepOutcome::Failed(error) => self.handle_delivery_failure(task, error),
            }
        }
        delivered
    }

    /// Resolve a delivery path for an envelope
    fn resolve_path(&self, envelope: &MessageEnvelope) -> Result<Vec<NodeName>, RouteError> {
        for endpoint in [&envelope.source, &envelope.target] {
            if !self.directory.contains(endpoint) {
                return Err(RouteError::UnknownNode {
                    name: endpoint.to_string(),
                });
            }
        }

        if envelope.source == envelope.target {
            // Self-addressed: a degenerate direct delivery
            return Ok(vec![envelope.source.clone(), envelope.target.clone()]);
        }

        {
            let graph = self.graph.read().unwrap();
            if graph.are_connected(&envelope.source, &envelope.target) {
                return Ok(vec![envelope.source.clone(), envelope.target.clone()]);
            }
            if let Some(path) = graph.shortest_path(&envelope.source, &envelope.target) {
                return Ok(path);
            }
        }

        self.link_fallback_path(&envelope.source, &envelope.target)
            .ok_or_else(|| RouteError::NoRoute {
                src: envelope.source.to_string(),
                target: envelope.target.to_string(),
            })
    }

    /// Breadth-first search over live connection records
    ///
    /// Covers links whose edges have not reached the topology graph yet.
    fn link_fallback_path(&self, from: &NodeName, to: &NodeName) -> Option<Vec<NodeName>> {
        let mut predecessor: BTreeMap<NodeName, NodeName> = BTreeMap::new();
        let mut visited: BTreeSet<NodeName> = BTreeSet::new();
        let mut frontier: VecDeque<NodeName> = VecDeque::new();

        visited.insert(from.clone());
        frontier.push_back(from.clone());

        while let Some(current) = frontier.pop_front() {
            for peer in self.links.link_peers(&current) {
                if !visited.insert(peer.clone()) {
                    continue;
                }
                predecessor.insert(peer.clone(), current.clone());
                if &peer == to {
                    let mut path = vec![to.clone()];
                    let mut cursor = to.clone();
                    while let Some(prev) = predecessor.get(&cursor) {
                        path.push(prev.clone());
                        cursor = prev.clone();
                    }
                    path.reverse();
                    debug!(from = %from, to = %to, "route recovered from connection records");
                    return Some(path);
                }
                frontier.push_back(peer);
            }
        }
        None
    }

    /// Move one task one hop
    async fn step_task(&self, task: &mut DeliveryTask) -> StepOutcome {
        if task.next_is_target() {
            // Terminal hand-off; a two-node path lands here on its first
            // pass with the cursor still at the source
            return match self
                .sink
                .deliver(&task.envelope.target, task.envelope.clone())
                .await
            {
                Ok(()) => {
                    task.status = DeliveryStatus::Delivered;
                    let latency_ms =
                        (Utc::now() - task.envelope.routed_at).num_milliseconds() as f64;
                    self.stats
                        .lock()
                        .unwrap()
                        .record_delivery(latency_ms.max(0.0), task.envelope.forward_count);
                    debug!(
                        message_id = %task.envelope.id,
                        target = %task.envelope.target,
                        forwards = task.envelope.forward_count,
                        latency_ms,
                        "delivered"
                    );
                    StepOutcome::Delivered
                }
                Err(error) => StepOutcome::Failed(error),
            };
        }

        let forwarder = task
            .next_hop()
            .cloned()
            .expect("non-terminal task has a next hop");
        let onward = task
            .hop_after_next()
            .cloned()
            .expect("non-terminal task has an onward hop");

        match self.forwarding_check(&forwarder, &onward) {
            Ok(()) => {
                task.envelope.record_forward(forwarder.clone());
                task.advance();
                self.stats.lock().unwrap().forwarded += 1;
                trace!(
                    message_id = %task.envelope.id,
                    via = %forwarder,
                    "forwarded"
                );
                StepOutcome::Advanced
            }
            Err(denial) => {
                // One alternative-path probe before the failure is charged
                if let Some(path) =
                    self.alternative_path(task.current(), &task.envelope.target, &forwarder)
                {
                    debug!(
                        message_id = %task.envelope.id,
                        refused = %forwarder,
                        "rerouting around refused hop"
                    );
                    task.replace_path(path);
                    StepOutcome::Advanced
                } else {
                    StepOutcome::Failed(denial)
                }
            }
        }
    }

    /// Verify that a hop may forward toward its onward hop
    fn forwarding_check(&self, forwarder: &NodeName, onward: &NodeName) -> Result<(), RouteError> {
        let profile = self
            .directory
            .profile(forwarder)
            .ok_or_else(|| RouteError::UnknownNode {
                name: forwarder.to_string(),
            })?;

        let reason = if profile.status != NodeStatus::Active {
            Some(DenialReason::Inactive)
        } else if !profile.capabilities.has(Capability::Routing) {
            Some(DenialReason::NotRouter)
        } else if !self.graph.read().unwrap().are_connected(forwarder, onward) {
            Some(DenialReason::Disconnected)
        } else {
            None
        };

        match reason {
            Some(reason) => Err(RouteError::ForwardingDenied {
                node: forwarder.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Probe the holder's other neighbors for a route around a refused hop
    fn alternative_path(
        &self,
        current: &NodeName,
        target: &NodeName,
        refused: &NodeName,
    ) -> Option<Vec<NodeName>> {
        let graph = self.graph.read().unwrap();
        let neighbors = graph.neighbors(current)?;

        for neighbor in neighbors {
            if neighbor == refused {
                continue;
            }
            if neighbor == target {
                return Some(vec![current.clone(), target.clone()]);
            }
            if let Some(tail) = graph.shortest_path(neighbor, target) {
                if tail.contains(refused) || tail.contains(current) {
                    continue;
                }
                let mut path = Vec::with_capacity(tail.len() + 1);
                path.push(current.clone());
                path.extend(tail);
                return Some(path);
            }
        }
        None
    }

    /// Charge one retry attempt; archive when the budget is exhausted
    fn handle_delivery_failure(&self, mut task: DeliveryTask, error: RouteError) {
        let attempts = task.envelope.register_attempt();
        if attempts < self.config.max_attempts {
            warn!(
                message_id = %task.envelope.id,
                attempts,
                error = %error,
                "delivery failed, re-queueing"
            );
            // A retry restarts from the source, so the trace starts over;
            // forward_count keeps the cumulative figure
            task.rewind();
            task.envelope.forward_path.clear();
            self.stats.lock().unwrap().retried += 1;
            self.delivery.lock().unwrap().push_back(task);
        } else {
            warn!(
                message_id = %task.envelope.id,
                attempts,
                error = %error,
                "retry budget exhausted, archiving"
            );
            task.status = DeliveryStatus::Failed;
            self.archive_failure(task.envelope, error);
        }
    }

    /// Move an envelope to the failed archive with its triggering error
    fn archive_failure(&self, envelope: MessageEnvelope, error: RouteError) {
        warn!(
            message_id = %envelope.id,
            source = %envelope.source,
            target = %envelope.target,
            error = %error,
            "message failed"
        );
        self.archive.push(FailedMessage::new(envelope, error));
        self.stats.lock().unwrap().failed += 1;
    }

    /// Resubmit an archived message with a fresh retry budget
    pub fn resubmit_failed(&self, id: &MessageId) -> Option<MessageId> {
        let mut failed = self.archive.take(id)?;
        failed.envelope.reset_attempts();
        Some(self.submit(failed.envelope))
    }

    /// Snapshot of the failed archive, oldest first
    pub fn failed_messages(&self) -> Vec<FailedMessage> {
        self.archive.snapshot()
    }

    /// Snapshot of the statistics counters
    pub fn stats(&self) -> RoutingStats {
        self.stats.lock().unwrap().clone()
    }

    /// Envelopes waiting for path resolution
    pub fn intake_len(&self) -> usize {
        self.intake.lock().unwrap().len()
    }

    /// Tasks in flight
    pub fn delivery_len(&self) -> usize {
        self.delivery.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::RwLock as StdRwLock;

    use meshnet_core::{CapabilitySet, NodeId, NodeProfile, NodeType};

    fn name(s: &str) -> NodeName {
        NodeName::new(s).unwrap()
    }

    fn profile(n: &str, status: NodeStatus, caps: CapabilitySet) -> NodeProfile {
        NodeProfile {
            id: NodeId::generate(),
            name: name(n),
            node_type: NodeType::Standard,
            status,
            capabilities: caps,
            trust_score: 50,
            connection_count: 0,
            created_at: Utc::now(),
            last_seen: Utc::now(),
        }
    }

    /// Directory double over a plain map
    #[derive(Default)]
    struct TestDirectory {
        nodes: StdRwLock<HashMap<NodeName, NodeProfile>>,
    }

    impl TestDirectory {
        fn add(&self, n: &str, status: NodeStatus, caps: CapabilitySet) {
            self.nodes
                .write()
                .unwrap()
                .insert(name(n), profile(n, status, caps));
        }

        fn add_router(&self, n: &str) {
            self.add(n, NodeStatus::Active, CapabilitySet::new().with(Capability::Routing));
        }

        fn add_plain(&self, n: &str) {
            self.add(n, NodeStatus::Active, CapabilitySet::new());
        }
    }

    impl NodeDirectory for TestDirectory {
        fn profile(&self, name: &NodeName) -> Option<NodeProfile> {
            self.nodes.read().unwrap().get(name).cloned()
        }

        fn profiles(&self) -> Vec<NodeProfile> {
            self.nodes.read().unwrap().values().cloned().collect()
        }
    }

    /// Link-record double: an edge list independent of the graph
    #[derive(Default)]
    struct TestLinks {
        edges: StdRwLock<Vec<(NodeName, NodeName)>>,
    }

    impl TestLinks {
        fn link(&self, a: &str, b: &str) {
            self.edges.write().unwrap().push((name(a), name(b)));
        }
    }

    impl LinkView for TestLinks {
        fn link_peers(&self, node: &NodeName) -> Vec<NodeName> {
            self.edges
                .read()
                .unwrap()
                .iter()
                .filter_map(|(a, b)| {
                    if a == node {
                        Some(b.clone())
                    } else if b == node {
                        Some(a.clone())
                    } else {
                        None
                    }
                })
                .collect()
        }
    }

    /// Sink double collecting delivered envelopes
    #[derive(Default)]
    struct TestInbox {
        delivered: StdRwLock<Vec<(NodeName, MessageEnvelope)>>,
    }

    impl TestInbox {
        fn count(&self) -> usize {
            self.delivered.read().unwrap().len()
        }

        fn last(&self) -> Option<(NodeName, MessageEnvelope)> {
            self.delivered.read().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl MessageSink for TestInbox {
        async fn deliver(
            &self,
            target: &NodeName,
            envelope: MessageEnvelope,
        ) -> Result<(), RouteError> {
            self.delivered
                .write()
                .unwrap()
                .push((target.clone(), envelope));
            Ok(())
        }
    }

    struct Fixture {
        directory: Arc<TestDirectory>,
        links: Arc<TestLinks>,
        inbox: Arc<TestInbox>,
        graph: Arc<RwLock<TopologyGraph>>,
        router: MeshRouter<TestDirectory, TestLinks, TestInbox>,
    }

    fn fixture() -> Fixture {
        let directory = Arc::new(TestDirectory::default());
        let links = Arc::new(TestLinks::default());
        let inbox = Arc::new(TestInbox::default());
        let graph = Arc::new(RwLock::new(TopologyGraph::new()));
        let router = MeshRouter::new(
            directory.clone(),
            links.clone(),
            inbox.clone(),
            graph.clone(),
        );
        Fixture {
            directory,
            links,
            inbox,
            graph,
            router,
        }
    }

    fn edge(fix: &Fixture, a: &str, b: &str) {
        fix.graph.write().unwrap().add_edge(name(a), name(b));
    }

    fn envelope(from: &str, to: &str) -> MessageEnvelope {
        MessageEnvelope::new(name(from), name(to), b"payload".to_vec())
    }

    #[tokio::test]
    async fn test_unknown_target_fails_at_intake() {
        let fix = fixture();
        fix.directory.add_plain("a");

        fix.router.submit(envelope("a", "ghost"));
        fix.router.process_intake();

        // Never entered the delivery queue, archived exactly once
        assert_eq!(fix.router.delivery_len(), 0);
        let failed = fix.router.failed_messages();
        assert_eq!(failed.len(), 1);
        assert!(matches!(
            failed[0].error,
            RouteError::UnknownNode { .. }
        ));
        assert_eq!(fix.router.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_no_route_is_terminal_at_intake() {
        let fix = fixture();
        fix.directory.add_plain("a");
        fix.directory.add_plain("z");
        fix.graph.write().unwrap().add_node(name("a"));
        fix.graph.write().unwrap().add_node(name("z"));

        fix.router.submit(envelope("a", "z"));
        fix.router.process_intake();

        let failed = fix.router.failed_messages();
        assert_eq!(failed.len(), 1);
        assert!(matches!(failed[0].error, RouteError::NoRoute { .. }));
        // Terminal: no attempts were charged
        assert_eq!(failed[0].attempts, 0);
    }

    #[tokio::test]
    async fn test_direct_delivery_in_one_pass() {
        let fix = fixture();
        fix.directory.add_plain("a");
        fix.directory.add_plain("b");
        edge(&fix, "a", "b");

        fix.router.submit(envelope("a", "b"));
        fix.router.process_intake();
        let delivered = fix.router.process_delivery().await;

        assert_eq!(delivered, 1);
        assert_eq!(fix.inbox.count(), 1);
        let (target, env) = fix.inbox.last().unwrap();
        assert_eq!(target, name("b"));
        assert_eq!(env.forward_count, 0);

        let stats = fix.router.stats();
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.direct_deliveries, 1);
    }

    #[tokio::test]
    async fn test_multi_hop_forwarding() {
        let fix = fixture();
        fix.directory.add_plain("a");
        fix.directory.add_router("b");
        fix.directory.add_plain("c");
        edge(&fix, "a", "b");
        edge(&fix, "b", "c");

        fix.router.submit(envelope("a", "c"));
        fix.router.process_intake();

        // First pass forwards through b, second pass delivers
        assert_eq!(fix.router.process_delivery().await, 0);
        assert_eq!(fix.router.process_delivery().await, 1);

        let (_, env) = fix.inbox.last().unwrap();
        assert_eq!(env.forward_path, vec![name("b")]);
        assert_eq!(env.forward_count, 1);
        assert_eq!(fix.router.stats().forwarded, 1);
        assert_eq!(fix.router.stats().multi_hop_deliveries, 1);
    }

    #[tokio::test]
    async fn test_forwarding_denied_exhausts_retries() {
        let fix = fixture();
        fix.directory.add_plain("a");
        // b is on the only path but cannot forward
        fix.directory.add(
            "b",
            NodeStatus::Active,
            CapabilitySet::new(),
        );
        fix.directory.add_plain("c");
        edge(&fix, "a", "b");
        edge(&fix, "b", "c");

        fix.router.submit(envelope("a", "c"));
        fix.router.process_intake();

        for _ in 0..3 {
            assert_eq!(fix.router.process_delivery().await, 0);
        }

        // Exactly one archive entry, failed counter advanced once
        assert_eq!(fix.router.delivery_len(), 0);
        let failed = fix.router.failed_messages();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].attempts, 3);
        assert!(matches!(
            failed[0].error,
            RouteError::ForwardingDenied {
                reason: DenialReason::NotRouter,
                ..
            }
        ));
        assert_eq!(fix.router.stats().failed, 1);
        assert_eq!(fix.router.stats().retried, 2);
    }

    #[tokio::test]
    async fn test_inactive_hop_reroutes_through_alternative() {
        // Diamond: a-b-d and a-c-d; b is inactive, c routes
        let fix = fixture();
        fix.directory.add_plain("a");
        fix.directory.add(
            "b",
            NodeStatus::Inactive,
            CapabilitySet::new().with(Capability::Routing),
        );
        fix.directory.add_router("c");
        fix.directory.add_plain("d");
        edge(&fix, "a", "b");
        edge(&fix, "a", "c");
        edge(&fix, "b", "d");
        edge(&fix, "c", "d");

        fix.router.submit(envelope("a", "d"));
        fix.router.process_intake();

        let mut delivered = 0;
        for _ in 0..4 {
            delivered += fix.router.process_delivery().await;
        }

        assert_eq!(delivered, 1);
        let (_, env) = fix.inbox.last().unwrap();
        assert_eq!(env.forward_path, vec![name("c")]);
        assert!(fix.router.failed_messages().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_search_over_link_records() {
        // Graph knows nothing; the connection records carry the route
        let fix = fixture();
        fix.directory.add_plain("a");
        fix.directory.add_router("b");
        fix.directory.add_plain("c");
        fix.links.link("a", "b");
        fix.links.link("b", "c");
        for n in ["a", "b", "c"] {
            fix.graph.write().unwrap().add_node(name(n));
        }

        fix.router.submit(envelope("a", "c"));
        fix.router.process_intake();

        // Path resolved from records even though the graph has no edges
        assert_eq!(fix.router.delivery_len(), 1);
    }

    #[tokio::test]
    async fn test_intake_batch_bound() {
        let fix = fixture();
        fix.directory.add_plain("a");
        fix.directory.add_plain("b");
        edge(&fix, "a", "b");

        for _ in 0..7 {
            fix.router.submit(envelope("a", "b"));
        }
        assert_eq!(fix.router.process_intake(), 5);
        assert_eq!(fix.router.intake_len(), 2);
        assert_eq!(fix.router.process_intake(), 2);
    }

    #[tokio::test]
    async fn test_delivery_batch_bound() {
        let fix = fixture();
        fix.directory.add_plain("a");
        fix.directory.add_plain("b");
        edge(&fix, "a", "b");

        for _ in 0..5 {
            fix.router.submit(envelope("a", "b"));
        }
        fix.router.process_intake();
        assert_eq!(fix.router.process_delivery().await, 3);
        assert_eq!(fix.router.process_delivery().await, 2);
    }

    #[tokio::test]
    async fn test_resubmit_failed_message() {
        let fix = fixture();
        fix.directory.add_plain("a");

        fix.router.submit(envelope("a", "ghost"));
        fix.router.process_intake();
        let failed = fix.router.failed_messages();
        let id = failed[0].envelope.id;

        // Register the missing node, then resubmit
        fix.directory.add_plain("ghost");
        edge(&fix, "a", "ghost");

        let resubmitted = fix.router.resubmit_failed(&id);
        assert_eq!(resubmitted, Some(id));
        assert!(fix.router.failed_messages().is_empty());

        fix.router.process_intake();
        assert_eq!(fix.router.process_delivery().await, 1);
        assert_eq!(fix.inbox.count(), 1);
    }

    #[tokio::test]
    async fn test_envelope_never_silently_dropped() {
        let fix = fixture();
        fix.directory.add_plain("a");
        fix.directory.add_plain("b");
        edge(&fix, "a", "b");

        let submitted = 6;
        for i in 0..submitted {
            let target = if i % 2 == 0 { "b" } else { "ghost" };
            fix.router.submit(envelope("a", target));
        }

        for _ in 0..4 {
            fix.router.process_intake();
            fix.router.process_delivery().await;
        }

        let stats = fix.router.stats();
        let accounted = stats.delivered
            + stats.failed
            + fix.router.intake_len() as u64
            + fix.router.delivery_len() as u64;
        assert_eq!(accounted, submitted);
    }
}
