//! Node and record identifiers
//!
//! Nodes are addressed by their display name throughout the stack: the
//! registry enforces uniqueness and the topology graph and router key
//! everything on [`NodeName`]. The uuid-backed identifiers exist so that
//! records keep a stable identity even if a name is ever reused.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RegistryError;

/// Display name of a node, the primary routing key
///
/// Names are unique within a registry and compare lexicographically,
/// which gives the topology graph a deterministic neighbor order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeName(String);

impl NodeName {
    /// Create a node name
    ///
    /// Names must be non-empty and contain no whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self, RegistryError> {
        let name = name.into();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(RegistryError::InvalidName(name));
        }
        Ok(Self(name))
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NodeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NodeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Stable identifier of a registered node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

/// Identifier of a connection record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

/// Identifier of a routed message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

macro_rules! uuid_id {
    ($name:ident) => {
        impl $name {
            /// Generate a fresh random identifier
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Short display form (for logging)
            pub fn short_id(&self) -> String {
                self.0.simple().to_string()[..8].to_string()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(NodeId);
uuid_id!(ConnectionId);
uuid_id!(MessageId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_name_creation() {
        assert!(NodeName::new("alpha").is_ok());
        assert!(NodeName::new("node-7").is_ok());
        assert!(NodeName::new("").is_err());
        assert!(NodeName::new("two words").is_err());
    }

    #[test]
    fn test_node_name_ordering() {
        let a = NodeName::new("alpha").unwrap();
        let b = NodeName::new("bravo").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(NodeId::generate(), NodeId::generate());
        assert_ne!(MessageId::generate(), MessageId::generate());
    }

    #[test]
    fn test_short_id_length() {
        let id = MessageId::generate();
        assert_eq!(id.short_id().len(), 8);
    }
}
