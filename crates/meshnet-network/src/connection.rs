//! Connection records between linked nodes
//!
//! A connection backs one pair of symmetric topology edges. The pair is
//! normalized so `(a, b)` and `(b, a)` address the same record, and it
//! is immutable once established; lifecycle ends with an explicit close
//! or a cascade when either endpoint is removed.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use meshnet_core::{ConnectionError, ConnectionId, LinkView, NodeName};

/// Kind of link between two nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    /// Encrypted link (the default)
    #[default]
    Secure,
    /// Unencrypted link
    Standard,
}

/// Lifecycle of a connection record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Establishing,
    Established,
    Closed,
}

/// Default security level for new connections (1..=5 scale)
pub const DEFAULT_SECURITY_LEVEL: u8 = 3;

/// Encryption label attached to secure connections
pub const DEFAULT_ENCRYPTION: &str = "chacha20-poly1305";

/// An established logical link between two nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    /// Lexicographically smaller endpoint
    pub peer_a: NodeName,
    /// Lexicographically larger endpoint
    pub peer_b: NodeName,
    pub kind: ConnectionType,
    pub status: ConnectionStatus,
    pub security_level: u8,
    /// Label of the encryption algorithm in use
    pub encryption: String,
    /// Messages that crossed this connection
    pub messages: u64,
    pub established_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Connection {
    /// Create a connection in the establishing state
    ///
    /// The endpoint pair is normalized so ordering never matters.
    pub fn new(a: NodeName, b: NodeName, kind: ConnectionType) -> Self {
        let (peer_a, peer_b) = if a < b { (a, b) } else { (b, a) };
        let now = Utc::now();
        Self {
            id: ConnectionId::generate(),
            peer_a,
            peer_b,
            kind,
            status: ConnectionStatus::Establishing,
            security_level: DEFAULT_SECURITY_LEVEL,
            encryption: match kind {
                ConnectionType::Secure => DEFAULT_ENCRYPTION.to_string(),
                ConnectionType::Standard => "none".to_string(),
            },
            messages: 0,
            established_at: now,
            last_activity: now,
        }
    }

    /// Normalized storage key
    pub fn key(&self) -> (NodeName, NodeName) {
        (self.peer_a.clone(), self.peer_b.clone())
    }

    /// Whether this connection touches the given node
    pub fn involves(&self, name: &NodeName) -> bool {
        &self.peer_a == name || &self.peer_b == name
    }

    /// The endpoint opposite to `name`, if `name` is an endpoint
    pub fn peer_of(&self, name: &NodeName) -> Option<&NodeName> {
        if &self.peer_a == name {
            Some(&self.peer_b)
        } else if &self.peer_b == name {
            Some(&self.peer_a)
        } else {
            None
        }
    }
}

fn pair_key(a: &NodeName, b: &NodeName) -> (NodeName, NodeName) {
    if a < b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// Pair-keyed store of connection records
#[derive(Debug, Default)]
pub struct ConnectionStore {
    connections: DashMap<(NodeName, NodeName), Connection>,
}

impl ConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or return the existing) connection between two nodes
    ///
    /// The record moves straight to established; a real transport would
    /// hold it in establishing until its handshake completes.
    pub fn add(
        &self,
        a: &NodeName,
        b: &NodeName,
        kind: ConnectionType,
    ) -> Result<Connection, ConnectionError> {
        if a == b {
            return Err(ConnectionError::SelfLink(a.to_string()));
        }
        let key = pair_key(a, b);
        if let Some(existing) = self.connections.get(&key) {
            return Ok(existing.clone());
        }

        let mut connection = Connection::new(a.clone(), b.clone(), kind);
        connection.status = ConnectionStatus::Established;
        debug!(
            connection_id = %connection.id,
            a = %connection.peer_a,
            b = %connection.peer_b,
            "connection established"
        );
        self.connections.insert(key, connection.clone());
        Ok(connection)
    }

    /// Close and remove one connection; `None` if it never existed
    pub fn remove(&self, a: &NodeName, b: &NodeName) -> Option<Connection> {
        self.connections
            .remove(&pair_key(a, b))
            .map(|(_, mut connection)| {
                connection.status = ConnectionStatus::Closed;
                debug!(connection_id = %connection.id, "connection closed");
                connection
            })
    }

    /// Close and remove every connection touching a node (cascade)
    pub fn remove_touching(&self, name: &NodeName) -> Vec<Connection> {
        let keys: Vec<(NodeName, NodeName)> = self
            .connections
            .iter()
            .filter(|entry| entry.value().involves(name))
            .map(|entry| entry.key().clone())
            .collect();

        keys.iter()
            .filter_map(|key| self.connections.remove(key))
            .map(|(_, mut connection)| {
                connection.status = ConnectionStatus::Closed;
                connection
            })
            .collect()
    }

    pub fn get(&self, a: &NodeName, b: &NodeName) -> Option<Connection> {
        self.connections
            .get(&pair_key(a, b))
            .map(|entry| entry.value().clone())
    }

    /// Count one message crossing the connection
    pub fn record_activity(&self, a: &NodeName, b: &NodeName) {
        if let Some(mut connection) = self.connections.get_mut(&pair_key(a, b)) {
            connection.messages += 1;
            connection.last_activity = Utc::now();
        }
    }

    pub fn all(&self) -> Vec<Connection> {
        self.connections
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl LinkView for ConnectionStore {
    fn link_peers(&self, name: &NodeName) -> Vec<NodeName> {
        self.connections
            .iter()
            .filter(|entry| entry.status == ConnectionStatus::Established)
            .filter_map(|entry| entry.peer_of(name).cloned())
            .collect()
    }
}
