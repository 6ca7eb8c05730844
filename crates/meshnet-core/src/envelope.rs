//! Message envelopes and failure records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::identity::{MessageId, NodeName};

/// A message submitted for routing
///
/// The payload is opaque to the core (conceptually sealed for the
/// target). The envelope carries the retry state and the forwarding
/// trace accumulated while the message moves hop by hop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Unique message identifier
    pub id: MessageId,
    /// Originating node
    pub source: NodeName,
    /// Final destination
    pub target: NodeName,
    /// Sealed payload bytes
    pub payload: Vec<u8>,
    /// Routing attempts consumed so far
    pub attempts: u32,
    /// When the message was accepted for routing
    pub routed_at: DateTime<Utc>,
    /// Intermediate nodes that forwarded this message, in order
    pub forward_path: Vec<NodeName>,
    /// Number of forward operations performed
    pub forward_count: u32,
}

impl MessageEnvelope {
    /// Create a new envelope ready for submission
    pub fn new(source: NodeName, target: NodeName, payload: Vec<u8>) -> Self {
        Self {
            id: MessageId::generate(),
            source,
            target,
            payload,
            attempts: 0,
            routed_at: Utc::now(),
            forward_path: Vec::new(),
            forward_count: 0,
        }
    }

    /// Record a forwarding hop in the trace
    pub fn record_forward(&mut self, hop: NodeName) {
        self.forward_path.push(hop);
        self.forward_count += 1;
    }

    /// Consume one routing attempt, returning the new count
    pub fn register_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    /// Reset retry state for explicit resubmission
    pub fn reset_attempts(&mut self) {
        self.attempts = 0;
    }

    /// Age of the envelope since it was accepted for routing
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.routed_at
    }
}

/// Terminal state of a delivery task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Delivered,
    Failed,
}

/// An envelope that exhausted its retry budget (or failed terminally)
///
/// Retained for operator inspection; never silently discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedMessage {
    pub envelope: MessageEnvelope,
    /// The error that triggered archival
    pub error: RouteError,
    /// Attempts consumed when archived
    pub attempts: u32,
    pub failed_at: DateTime<Utc>,
}

impl FailedMessage {
    pub fn new(envelope: MessageEnvelope, error: RouteError) -> Self {
        let attempts = envelope.attempts;
        Self {
            envelope,
            error,
            attempts,
            failed_at: Utc::now(),
        }
    }
}
