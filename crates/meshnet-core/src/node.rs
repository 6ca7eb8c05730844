//! Node model: types, status, capabilities, and the read-view profile

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{NodeId, NodeName};

/// Role of a node in the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Ordinary participant
    #[default]
    Standard,
    /// Forwards traffic for other nodes
    Router,
    /// Bridges to other networks
    Gateway,
    /// Data-producing endpoint
    Sensor,
}

impl NodeType {
    /// Lowercase label, matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Router => "router",
            Self::Gateway => "gateway",
            Self::Sensor => "sensor",
        }
    }
}

impl Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Participating in the network
    #[default]
    Active,
    /// Registered but not participating
    Inactive,
    /// Terminal state before removal
    Shutdown,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Shutdown => "shutdown",
        }
    }
}

impl Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed vocabulary of node capabilities
///
/// The capability set is small and known, so it is modeled as an enum
/// rather than a free-form bag. Free-text attributes live alongside in
/// [`CapabilitySet::attributes`] for search-only matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// May forward messages for other nodes
    Routing,
    /// Bridges traffic out of the mesh
    Gateway,
    /// Produces sensor readings
    Sensor,
    /// Stores payloads for offline peers
    Storage,
    /// Relays discovery announcements
    Relay,
    /// Supports payload encryption
    Encryption,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Routing => "routing",
            Self::Gateway => "gateway",
            Self::Sensor => "sensor",
            Self::Storage => "storage",
            Self::Relay => "relay",
            Self::Encryption => "encryption",
        }
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Enabled capabilities plus free-text attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    /// Capabilities flagged true
    enabled: BTreeSet<Capability>,
    /// String-valued extras, matched by substring in search only
    attributes: BTreeMap<String, String>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style enable
    pub fn with(mut self, capability: Capability) -> Self {
        self.enabled.insert(capability);
        self
    }

    pub fn enable(&mut self, capability: Capability) {
        self.enabled.insert(capability);
    }

    pub fn disable(&mut self, capability: Capability) {
        self.enabled.remove(&capability);
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.enabled.contains(&capability)
    }

    /// Number of capabilities flagged true (feeds relevance scoring)
    pub fn enabled_count(&self) -> usize {
        self.enabled.len()
    }

    pub fn enabled(&self) -> impl Iterator<Item = Capability> + '_ {
        self.enabled.iter().copied()
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Search matching: an enabled capability with this exact name, or a
    /// string attribute whose value contains the term.
    pub fn matches(&self, term: &str) -> bool {
        self.enabled.iter().any(|c| c.as_str() == term)
            || self.attributes.values().any(|v| v.contains(term))
    }
}

/// Read-view of a registered node
///
/// Snapshots of this type are handed to the discovery index, the router,
/// and the topology snapshot surface. The connection count is derived by
/// the orchestrator from the connection store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeProfile {
    pub id: NodeId,
    pub name: NodeName,
    pub node_type: NodeType,
    pub status: NodeStatus,
    pub capabilities: CapabilitySet,
    /// Trust score, clamped to 0..=100
    pub trust_score: u8,
    pub connection_count: usize,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl NodeProfile {
    /// Whether this node may forward messages for others right now
    pub fn can_forward(&self) -> bool {
        self.status == NodeStatus::Active && self.capabilities.has(Capability::Routing)
    }
}

/// Clamp a raw trust value into the 0..=100 score range
pub fn clamp_trust(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_set_flags() {
        let mut caps = CapabilitySet::new();
        assert!(!caps.has(Capability::Routing));

        caps.enable(Capability::Routing);
        caps.enable(Capability::Storage);
        assert!(caps.has(Capability::Routing));
        assert_eq!(caps.enabled_count(), 2);

        caps.disable(Capability::Routing);
        assert!(!caps.has(Capability::Routing));
    }

    #[test]
    fn test_capability_matching() {
        let mut caps = CapabilitySet::new().with(Capability::Gateway);
        caps.set_attribute("region", "eu-west-underlay");

        assert!(caps.matches("gateway"));
        assert!(!caps.matches("routing"));
        // Substring match on string-valued attributes
        assert!(caps.matches("eu-west"));
        assert!(!caps.matches("us-east"));
    }

    #[test]
    fn test_trust_clamping() {
        assert_eq!(clamp_trust(-5), 0);
        assert_eq!(clamp_trust(50), 50);
        assert_eq!(clamp_trust(250), 100);
    }

    #[test]
    fn test_type_labels_are_lowercase() {
        assert_eq!(NodeType::Gateway.as_str(), "gateway");
        assert_eq!(NodeStatus::Active.as_str(), "active");
        assert_eq!(
            serde_json::to_string(&NodeType::Sensor).unwrap(),
            "\"sensor\""
        );
    }
}
