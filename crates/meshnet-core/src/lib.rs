//! # Meshnet Core
//!
//! Core traits, types, and errors for the meshnet simulation stack.
//!
//! This crate provides the foundational abstractions shared by the
//! topology, routing, discovery, and orchestration crates.
//!
//! ## Key Traits
//!
//! - [`NodeDirectory`]: read access to the authoritative node registry
//! - [`LinkView`]: read access to live connection records (fallback routing)
//! - [`MessageSink`]: delivery endpoint for routed envelopes
//! - [`Clock`]: time abstraction for testability
//! - [`Signer`]: opaque signing capability for discovery announcements
//!
//! ## Key Types
//!
//! - [`NodeName`]: display name, the primary routing key
//! - [`NodeProfile`]: read-view of a registered node
//! - [`MessageEnvelope`]: a message submitted for routing, with retry state
//! - [`MeshError`]: top-level error taxonomy

pub mod error;
pub mod identity;
pub mod node;
pub mod envelope;
pub mod traits;

// Re-export main types
pub use error::*;
pub use identity::*;
pub use node::*;
pub use envelope::*;
pub use traits::*;
