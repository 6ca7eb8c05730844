//! Search queries, result scoring, and canonical fingerprints

use serde::{Deserialize, Serialize};

use meshnet_core::{DiscoveryError, NodeProfile, NodeStatus, NodeType};

/// Default number of results returned when no limit is given
pub const DEFAULT_RESULT_LIMIT: usize = 50;

/// Search criteria; populated fields are ANDed together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Case-insensitive substring match on the display name
    pub name: Option<String>,
    /// Exact node type
    pub node_type: Option<NodeType>,
    /// Enabled capability name, or substring of a string attribute
    pub capability: Option<String>,
    /// Exact status
    pub status: Option<NodeStatus>,
    /// Inclusive lower bound on the trust score
    pub min_trust: Option<u8>,
}

impl SearchQuery {
    /// Reject queries that can never match anything
    pub fn validate(&self) -> Result<(), DiscoveryError> {
        if matches!(&self.name, Some(n) if n.is_empty()) {
            return Err(DiscoveryError::InvalidQuery(
                "empty name filter".to_string(),
            ));
        }
        if matches!(&self.capability, Some(c) if c.is_empty()) {
            return Err(DiscoveryError::InvalidQuery(
                "empty capability filter".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a profile satisfies every populated criterion
    pub fn matches(&self, profile: &NodeProfile) -> bool {
        if let Some(name) = &self.name {
            let haystack = profile.name.as_str().to_lowercase();
            if !haystack.contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some(node_type) = self.node_type {
            if profile.node_type != node_type {
                return false;
            }
        }
        if let Some(capability) = &self.capability {
            if !profile.capabilities.matches(capability) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if profile.status != status {
                return false;
            }
        }
        if let Some(min_trust) = self.min_trust {
            if profile.trust_score < min_trust {
                return false;
            }
        }
        true
    }
}

/// Sort key for search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Relevance descending (the default)
    #[default]
    Relevance,
    /// Name ascending
    Name,
    /// Node type ascending
    NodeType,
    /// Trust score descending
    TrustScore,
    /// Connection count descending
    Connections,
}

/// Result shaping applied after matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub sort: SortKey,
    /// Node types dropped from the results
    pub exclude_types: Vec<NodeType>,
    pub min_connections: Option<usize>,
    pub max_connections: Option<usize>,
    pub limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            sort: SortKey::default(),
            exclude_types: Vec::new(),
            min_connections: None,
            max_connections: None,
            limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

impl SearchOptions {
    /// Whether a matched profile survives the post-filters
    pub fn permits(&self, profile: &NodeProfile) -> bool {
        if self.exclude_types.contains(&profile.node_type) {
            return false;
        }
        if let Some(min) = self.min_connections {
            if profile.connection_count < min {
                return false;
            }
        }
        if let Some(max) = self.max_connections {
            if profile.connection_count > max {
                return false;
            }
        }
        true
    }
}

/// A scored search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub profile: NodeProfile,
    pub relevance: f64,
}

/// Composite relevance score in `0.5..=1.0`
///
/// Base 0.5, plus trust, connectedness, liveness, and capability
/// contributions, capped at 1.0.
pub fn relevance(profile: &NodeProfile) -> f64 {
    let trust = 0.3 * (profile.trust_score as f64 / 100.0);
    let connections = 0.2 * (profile.connection_count as f64 / 10.0).min(1.0);
    let active = if profile.status == NodeStatus::Active {
        0.1
    } else {
        0.0
    };
    let capabilities = 0.1 * (profile.capabilities.enabled_count() as f64 / 6.0).min(1.0);
    (0.5 + trust + connections + active + capabilities).min(1.0)
}

/// Sort hits in place according to the requested key
///
/// Every key breaks ties by name so result order is deterministic.
pub fn sort_hits(hits: &mut [SearchHit], key: SortKey) {
    match key {
        SortKey::Relevance => hits.sort_by(|a, b| {
            b.relevance
                .total_cmp(&a.relevance)
                .then_with(|| a.profile.name.cmp(&b.profile.name))
        }),
        SortKey::Name => hits.sort_by(|a, b| a.profile.name.cmp(&b.profile.name)),
        SortKey::NodeType => hits.sort_by(|a, b| {
            a.profile
                .node_type
                .cmp(&b.profile.node_type)
                .then_with(|| a.profile.name.cmp(&b.profile.name))
        }),
        SortKey::TrustScore => hits.sort_by(|a, b| {
            b.profile
                .trust_score
                .cmp(&a.profile.trust_score)
                .then_with(|| a.profile.name.cmp(&b.profile.name))
        }),
        SortKey::Connections => hits.sort_by(|a, b| {
            b.profile
                .connection_count
                .cmp(&a.profile.connection_count)
                .then_with(|| a.profile.name.cmp(&b.profile.name))
        }),
    }
}

/// Canonical sorted-key JSON form of a query + options pair
///
/// `serde_json` maps are ordered, so serializing through `Value` yields
/// a stable fingerprint regardless of field declaration order.
pub fn fingerprint(query: &SearchQuery, options: &SearchOptions) -> String {
    let value = serde_json::json!({
        "query": query,
        "options": options,
    });
    value.to_string()
}
