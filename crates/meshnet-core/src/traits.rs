//! Core traits for the meshnet stack
//!
//! These seams keep the routing and discovery logic independent of the
//! orchestrator's concrete storage:
//!
//! - [`NodeDirectory`]: read access to registered nodes
//! - [`LinkView`]: read access to live connection records
//! - [`MessageSink`]: delivery endpoint for routed envelopes
//! - [`Clock`]: time abstraction for testability
//! - [`Signer`]: opaque signing capability (discovery announcements)

use std::future::Future;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::envelope::MessageEnvelope;
use crate::error::RouteError;
use crate::identity::NodeName;
use crate::node::NodeProfile;

/// Read access to the authoritative node registry
///
/// The router consults this to validate endpoints and check forwarding
/// eligibility; the discovery index scores and filters over it.
pub trait NodeDirectory: Send + Sync {
    /// Look up one node's profile
    fn profile(&self, name: &NodeName) -> Option<NodeProfile>;

    /// All registered profiles
    fn profiles(&self) -> Vec<NodeProfile>;

    /// Check whether a name is registered
    fn contains(&self, name: &NodeName) -> bool {
        self.profile(name).is_some()
    }
}

/// Read access to live connection records
///
/// The router's fallback path search walks connection records directly,
/// covering links not yet reflected in the topology graph.
pub trait LinkView: Send + Sync {
    /// Peers with an established connection to `name`
    fn link_peers(&self, name: &NodeName) -> Vec<NodeName>;
}

/// Delivery endpoint for routed envelopes
///
/// Implemented by the registry (node inboxes) in the orchestrator.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Hand a fully-routed envelope to its target's inbox
    async fn deliver(&self, target: &NodeName, envelope: MessageEnvelope)
    -> Result<(), RouteError>;
}

/// Time abstraction for testability
///
/// This trait allows tests to control time, enabling deterministic
/// testing of time-dependent behavior.
pub trait Clock: Send + Sync {
    /// Get the current instant (monotonic time)
    fn now(&self) -> Instant;

    /// Get the current UTC datetime
    fn now_utc(&self) -> DateTime<Utc>;

    /// Sleep for a duration (async)
    fn sleep(&self, duration: std::time::Duration) -> impl Future<Output = ()> + Send;
}

/// Real clock implementation using system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: std::time::Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Opaque signing capability
///
/// Key management and real signatures live outside this stack; the
/// discovery announcement path only needs `sign` and `verify`.
pub trait Signer: Send + Sync {
    /// Sign a payload, returning the signature bytes
    fn sign(&self, payload: &[u8]) -> Vec<u8>;

    /// Verify a signature produced by this signer
    fn verify(&self, payload: &[u8], signature: &[u8]) -> bool;
}

/// Deterministic stand-in signer for simulation
///
/// Produces a stable digest of the payload and a key label. Not
/// cryptographic; real deployments plug in an external signer.
#[derive(Debug, Clone)]
pub struct SimulationSigner {
    key_label: String,
}

impl SimulationSigner {
    pub fn new(key_label: impl Into<String>) -> Self {
        Self {
            key_label: key_label.into(),
        }
    }

    fn digest(&self, payload: &[u8]) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.key_label.hash(&mut hasher);
        payload.hash(&mut hasher);
        hasher.finish()
    }
}

impl Signer for SimulationSigner {
    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        self.digest(payload).to_be_bytes().to_vec()
    }

    fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        signature == self.digest(payload).to_be_bytes()
    }
}
