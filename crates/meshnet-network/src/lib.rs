//! # Meshnet Network
//!
//! The orchestrator: owns the authoritative [`NodeRegistry`] and
//! [`ConnectionStore`], keeps the topology graph and discovery index in
//! step with every mutation, and wires the router's pipeline to them.
//!
//! [`MeshNetwork`] is the single entry point the CLI/API layer talks to:
//! node and connection CRUD, message submission, search, and the
//! observability surfaces (topology snapshot, connectivity analysis,
//! routing statistics, failed messages).

pub mod connection;
pub mod network;
pub mod registry;

pub use connection::*;
pub use network::*;
pub use registry::*;
