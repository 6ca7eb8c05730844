//! # Meshnet Routing
//!
//! The routing pipeline: accepts message envelopes, resolves delivery
//! paths against the topology graph, and drives hop-by-hop forwarding
//! with bounded retries.
//!
//! ## Pipeline
//!
//! 1. **Intake**: batches of queued envelopes are validated and path-resolved
//!    (direct edge, then graph shortest path, then a fallback search over
//!    live connection records)
//! 2. **Delivery**: batches of tasks move one hop per pass; intermediate
//!    hops are verified (active, routing-capable, connected onward) with one
//!    alternative-path probe before a failure is charged
//! 3. **Failure**: delivery failures consume retry attempts; exhausted
//!    envelopes land in a bounded archive for operator inspection
//!
//! An envelope is always in exactly one of: intake queue, delivery queue,
//! failed archive, or a target inbox.

pub mod archive;
pub mod router;
pub mod stats;
pub mod task;

pub use archive::*;
pub use router::*;
pub use stats::*;
pub use task::*;
