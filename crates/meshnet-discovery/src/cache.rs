//! TTL-bounded result caches
//!
//! Entries are checked for staleness on read and replaced on the next
//! insert; a periodic sweep prunes what reads never touch again. Reads
//! never wait on cleanup, so a just-expired entry may be served once
//! more before the sweep catches it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::trace;

use meshnet_core::{NodeName, NodeProfile};

use crate::query::SearchHit;

/// How long cached query results stay fresh
pub const QUERY_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// How long per-node snapshots stay fresh
pub const SNAPSHOT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Hit/miss counters exposed for observability
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheCounters {
    pub hits: u64,
    pub misses: u64,
}

fn is_fresh(cached_at: DateTime<Utc>, ttl: Duration) -> bool {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
    Utc::now() - cached_at < ttl
}

#[derive(Debug, Clone)]
struct QueryEntry {
    results: Vec<SearchHit>,
    cached_at: DateTime<Utc>,
    access_count: u64,
}

/// Cache of scored search results keyed by query fingerprint
#[derive(Debug)]
pub struct QueryCache {
    entries: DashMap<String, QueryEntry>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Fetch cached results; a stale or absent entry counts as a miss
    pub fn get(&self, fingerprint: &str) -> Option<Vec<SearchHit>> {
        let result = match self.entries.get_mut(fingerprint) {
            Some(mut entry) if is_fresh(entry.cached_at, self.ttl) => {
                entry.access_count += 1;
                Some(entry.results.clone())
            }
            _ => None,
        };

        match &result {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        result
    }

    /// Store (or refresh) results for a fingerprint
    pub fn insert(&self, fingerprint: String, results: Vec<SearchHit>) {
        self.entries.insert(
            fingerprint,
            QueryEntry {
                results,
                cached_at: Utc::now(),
                access_count: 0,
            },
        );
    }

    /// Drop expired entries; returns how many were removed
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| is_fresh(entry.cached_at, self.ttl));
        let removed = before - self.entries.len();
        if removed > 0 {
            trace!(removed, "query cache sweep");
        }
        removed
    }

    pub fn counters(&self) -> CacheCounters {
        CacheCounters {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(QUERY_CACHE_TTL)
    }
}

#[derive(Debug, Clone)]
struct SnapshotEntry {
    profile: NodeProfile,
    cached_at: DateTime<Utc>,
}

/// Cache of per-node profile snapshots for direct lookups
#[derive(Debug)]
pub struct SnapshotCache {
    entries: DashMap<NodeName, SnapshotEntry>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, name: &NodeName) -> Option<NodeProfile> {
        let result = match self.entries.get(name) {
            Some(entry) if is_fresh(entry.cached_at, self.ttl) => Some(entry.profile.clone()),
            _ => None,
        };
        match &result {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        result
    }

    pub fn insert(&self, profile: NodeProfile) {
        self.entries.insert(
            profile.name.clone(),
            SnapshotEntry {
                profile,
                cached_at: Utc::now(),
            },
        );
    }

    /// Drop one node's snapshot (on update or removal)
    pub fn invalidate(&self, name: &NodeName) {
        self.entries.remove(name);
    }

    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| is_fresh(entry.cached_at, self.ttl));
        before - self.entries.len()
    }

    pub fn counters(&self) -> CacheCounters {
        CacheCounters {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(SNAPSHOT_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use meshnet_core::{CapabilitySet, NodeId, NodeStatus, NodeType};

    fn profile(name: &str) -> NodeProfile {
        NodeProfile {
            id: NodeId::generate(),
            name: NodeName::new(name).unwrap(),
            node_type: NodeType::Standard,
            status: NodeStatus::Active,
            capabilities: CapabilitySet::new(),
            trust_score: 50,
            connection_count: 0,
            created_at: Utc::now(),
            last_seen: Utc::now(),
        }
    }

    #[test]
    fn test_query_cache_hit_and_miss_counters() {
        let cache = QueryCache::default();

        assert!(cache.get("q1").is_none());
        cache.insert("q1".to_string(), Vec::new());
        assert!(cache.get("q1").is_some());

        let counters = cache.counters();
        assert_eq!(counters.hits, 1);
        assert_eq!(counters.misses, 1);
    }

    #[test]
    fn test_zero_ttl_entries_expire_immediately() {
        let cache = QueryCache::new(Duration::ZERO);
        cache.insert("q".to_string(), Vec::new());
        // Already stale on the next read
        assert!(cache.get("q").is_none());
        assert_eq!(cache.sweep(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_sweep_keeps_fresh_entries() {
        let cache = QueryCache::default();
        cache.insert("fresh".to_string(), Vec::new());
        assert_eq!(cache.sweep(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_snapshot_cache_roundtrip() {
        let cache = SnapshotCache::default();
        let name = NodeName::new("alpha").unwrap();

        assert!(cache.get(&name).is_none());
        cache.insert(profile("alpha"));
        assert_eq!(cache.get(&name).unwrap().name, name);

        cache.invalidate(&name);
        assert!(cache.get(&name).is_none());
    }

    #[test]
    fn test_snapshot_cache_expiry() {
        let cache = SnapshotCache::new(Duration::ZERO);
        cache.insert(profile("beta"));
        assert!(cache.get(&NodeName::new("beta").unwrap()).is_none());
        assert_eq!(cache.sweep(), 1);
    }
}
