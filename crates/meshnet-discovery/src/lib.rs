//! # Meshnet Discovery
//!
//! Searchable view over the node registry plus short-lived result caches:
//!
//! - [`DiscoveryIndex`]: by-name, by-type, and by-capability indexes with
//!   relevance-scored search
//! - [`QueryCache`] / [`SnapshotCache`]: TTL-bounded caches with hit/miss
//!   accounting (5 minutes for query results, 30 minutes for per-node
//!   snapshots)
//! - [`Announcement`]: node profiles signed through the opaque [`Signer`]
//!   capability
//!
//! [`Signer`]: meshnet_core::Signer

pub mod announce;
pub mod cache;
pub mod index;
pub mod query;

pub use announce::*;
pub use cache::*;
pub use index::*;
pub use query::*;
