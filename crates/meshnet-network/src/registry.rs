//! Authoritative node registry
//!
//! Maps node names to node state. Everything else in the stack reads
//! nodes through the [`NodeDirectory`] view; delivered messages land in
//! the per-node inboxes through the [`MessageSink`] impl.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, trace};

use meshnet_core::{
    CapabilitySet, MessageEnvelope, MessageSink, NodeDirectory, NodeId, NodeName, NodeProfile,
    NodeStatus, NodeType, RegistryError, RouteError, clamp_trust,
};

/// Parameters for creating a node
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    pub node_type: NodeType,
    pub capabilities: CapabilitySet,
    /// Raw trust value, clamped into 0..=100 on insert
    pub trust_score: i64,
}

impl NodeSpec {
    pub fn with_type(node_type: NodeType) -> Self {
        Self {
            node_type,
            ..Default::default()
        }
    }
}

/// Full node state, including the inbox
#[derive(Debug, Clone)]
struct NodeRecord {
    profile: NodeProfile,
    inbox: Vec<MessageEnvelope>,
}

/// Name-keyed node store with unique display names
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: DashMap<NodeName, NodeRecord>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node; names must be unique
    pub fn insert(&self, name: NodeName, spec: NodeSpec) -> Result<NodeProfile, RegistryError> {
        if self.nodes.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        let now = Utc::now();
        let profile = NodeProfile {
            id: NodeId::generate(),
            name: name.clone(),
            node_type: spec.node_type,
            status: NodeStatus::Active,
            capabilities: spec.capabilities,
            trust_score: clamp_trust(spec.trust_score),
            connection_count: 0,
            created_at: now,
            last_seen: now,
        };
        self.nodes.insert(
            name,
            NodeRecord {
                profile: profile.clone(),
                inbox: Vec::new(),
            },
        );
        debug!(node = %profile.name, node_type = %profile.node_type, "node registered");
        Ok(profile)
    }

    /// Remove a node; returns its final profile, or `None` if absent
    pub fn remove(&self, name: &NodeName) -> Option<NodeProfile> {
        self.nodes.remove(name).map(|(_, record)| record.profile)
    }

    pub fn set_status(&self, name: &NodeName, status: NodeStatus) -> Result<(), RegistryError> {
        let mut record = self
            .nodes
            .get_mut(name)
            .ok_or_else(|| RegistryError::UnknownNode(name.to_string()))?;
        record.profile.status = status;
        record.profile.last_seen = Utc::now();
        debug!(node = %name, status = %status, "node status changed");
        Ok(())
    }

    pub fn set_trust(&self, name: &NodeName, raw: i64) -> Result<(), RegistryError> {
        let mut record = self
            .nodes
            .get_mut(name)
            .ok_or_else(|| RegistryError::UnknownNode(name.to_string()))?;
        record.profile.trust_score = clamp_trust(raw);
        Ok(())
    }

    /// Shift the derived connection count (maintained by the orchestrator)
    pub fn adjust_connections(&self, name: &NodeName, delta: isize) {
        if let Some(mut record) = self.nodes.get_mut(name) {
            record.profile.connection_count =
                record.profile.connection_count.saturating_add_signed(delta);
        }
    }

    /// Refresh a node's last-seen timestamp
    pub fn touch(&self, name: &NodeName) {
        if let Some(mut record) = self.nodes.get_mut(name) {
            record.profile.last_seen = Utc::now();
        }
    }

    /// Drain a node's inbox (delivered envelopes, oldest first)
    pub fn take_inbox(&self, name: &NodeName) -> Vec<MessageEnvelope> {
        self.nodes
            .get_mut(name)
            .map(|mut record| std::mem::take(&mut record.inbox))
            .unwrap_or_default()
    }

    /// Number of envelopes waiting in a node's inbox
    pub fn inbox_len(&self, name: &NodeName) -> usize {
        self.nodes
            .get(name)
            .map(|record| record.inbox.len())
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl NodeDirectory for NodeRegistry {
    fn profile(&self, name: &NodeName) -> Option<NodeProfile> {
        self.nodes.get(name).map(|record| record.profile.clone())
    }

    fn profiles(&self) -> Vec<NodeProfile> {
        self.nodes
            .iter()
            .map(|entry| entry.profile.clone())
            .collect()
    }
}

#[async_trait]
impl MessageSink for NodeRegistry {
    /// Deliver into the target's inbox
    async fn deliver(
        &self,
        target: &NodeName,
        envelope: MessageEnvelope,
    ) -> Result<(), RouteError> {
        let mut record = self
            .nodes
            .get_mut(target)
            .ok_or_else(|| RouteError::UnknownNode {
                name: target.to_string(),
            })?;
        trace!(node = %target, message_id = %envelope.id, "envelope delivered to inbox");
        record.inbox.push(envelope);
        record.profile.last_seen = Utc::now();
        Ok(())
    }
}
