//! In-flight delivery state for one envelope

use serde::{Deserialize, Serialize};

use meshnet_core::{DeliveryStatus, MessageEnvelope, NodeName};

/// An envelope paired with its resolved path and a cursor into it
///
/// `current_hop` indexes the node currently holding the message; each
/// delivery pass moves the message one hop. The path always starts at
/// the source and ends at the target, endpoints inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryTask {
    pub envelope: MessageEnvelope,
    pub routing_path: Vec<NodeName>,
    pub current_hop: usize,
    pub status: DeliveryStatus,
}

impl DeliveryTask {
    pub fn new(envelope: MessageEnvelope, routing_path: Vec<NodeName>) -> Self {
        Self {
            envelope,
            routing_path,
            current_hop: 0,
            status: DeliveryStatus::Pending,
        }
    }

    /// The node currently holding the message
    pub fn current(&self) -> &NodeName {
        &self.routing_path[self.current_hop]
    }

    /// The node the message is handed to next
    pub fn next_hop(&self) -> Option<&NodeName> {
        self.routing_path.get(self.current_hop + 1)
    }

    /// The hop after the next one (what a forwarder must reach)
    pub fn hop_after_next(&self) -> Option<&NodeName> {
        self.routing_path.get(self.current_hop + 2)
    }

    /// Whether the next hand-off reaches the target
    pub fn next_is_target(&self) -> bool {
        self.current_hop + 2 >= self.routing_path.len()
    }

    /// Advance the cursor one hop
    pub fn advance(&mut self) {
        self.current_hop += 1;
    }

    /// Swap in a replacement path and restart from its head
    pub fn replace_path(&mut self, path: Vec<NodeName>) {
        self.routing_path = path;
        self.current_hop = 0;
    }

    /// Restart the existing path from the source (retry)
    pub fn rewind(&mut self) {
        self.current_hop = 0;
    }
}
