//! Routing pipeline statistics

use serde::{Deserialize, Serialize};

/// Counters and derived figures for the routing pipeline
///
/// `routed` counts submissions, not deliveries; every submitted envelope
/// eventually shows up in `delivered` or `failed`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingStats {
    /// Envelopes accepted into the intake queue
    pub routed: u64,
    /// Envelopes handed to a target inbox
    pub delivered: u64,
    /// Envelopes archived after terminal failure
    pub failed: u64,
    /// Individual forward operations performed
    pub forwarded: u64,
    /// Delivery attempts that were re-queued
    pub retried: u64,
    /// Deliveries that never left the source-target edge
    pub direct_deliveries: u64,
    /// Deliveries that traversed at least one intermediate hop
    pub multi_hop_deliveries: u64,
    /// Running average delivery latency in milliseconds
    pub average_latency_ms: f64,
}

impl RoutingStats {
    /// Fold one delivery into the counters and the running average
    pub(crate) fn record_delivery(&mut self, latency_ms: f64, forward_count: u32) {
        self.delivered += 1;
        if forward_count == 0 {
            self.direct_deliveries += 1;
        } else {
            self.multi_hop_deliveries += 1;
        }
        self.average_latency_ms +=
            (latency_ms - self.average_latency_ms) / self.delivered as f64;
    }
}
