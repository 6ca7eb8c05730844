//! Error types for the meshnet stack

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for meshnet operations
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Routing error: {0}")]
    Routing(#[from] RouteError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),
}

/// Errors related to the node registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Node name already registered: {0}")]
    DuplicateName(String),

    #[error("Node not found: {0}")]
    UnknownNode(String),

    #[error("Invalid node name: {0:?}")]
    InvalidName(String),
}

/// Errors related to connection management
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("Connection endpoint not registered: {0}")]
    UnknownEndpoint(String),

    #[error("Node cannot connect to itself: {0}")]
    SelfLink(String),
}

/// Why an intermediate node refused to forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DenialReason {
    /// Node is not active
    Inactive,
    /// Node lacks the routing capability
    NotRouter,
    /// Node has no edge to the next hop
    Disconnected,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Inactive => "node inactive",
            Self::NotRouter => "missing routing capability",
            Self::Disconnected => "no edge to next hop",
        };
        write!(f, "{label}")
    }
}

/// Errors raised by the routing pipeline
///
/// `UnknownNode` and `NoRoute` diagnosed at intake are terminal; delivery
/// failures consume retry attempts until `RetryExhausted`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RouteError {
    #[error("Unknown node: {name}")]
    UnknownNode { name: String },

    #[error("No route from {src} to {target}")]
    NoRoute {
        #[serde(rename = "source")]
        src: String,
        target: String,
    },

    #[error("Forwarding denied at {node}: {reason}")]
    ForwardingDenied { node: String, reason: DenialReason },

    #[error("Retry budget exhausted after {attempts} attempts")]
    RetryExhausted { attempts: u32 },
}

/// Errors raised by the discovery index
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    #[error("Announcement failed: {0}")]
    AnnouncementFailed(String),
}

/// Result type alias for meshnet operations
pub type MeshResult<T> = Result<T, MeshError>;
