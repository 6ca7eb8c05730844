//! Secondary indexes and the search entry point

use std::collections::BTreeSet;
use std::str::FromStr;

use dashmap::DashMap;
use tracing::{debug, trace};

use meshnet_core::{
    Capability, DiscoveryError, NodeDirectory, NodeName, NodeProfile, NodeType,
};

use crate::cache::{CacheCounters, QueryCache, SnapshotCache};
use crate::query::{SearchHit, SearchOptions, SearchQuery, fingerprint, relevance, sort_hits};

/// A capability term that named a closed-enum capability exactly
struct ParsedCapability(Capability);

impl FromStr for ParsedCapability {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let capability = match s {
            "routing" => Capability::Routing,
            "gateway" => Capability::Gateway,
            "sensor" => Capability::Sensor,
            "storage" => Capability::Storage,
            "relay" => Capability::Relay,
            "encryption" => Capability::Encryption,
            _ => return Err(()),
        };
        Ok(ParsedCapability(capability))
    }
}

/// Searchable view over the node registry
///
/// The orchestrator calls [`index`](DiscoveryIndex::index) on every node
/// create/update and [`deindex`](DiscoveryIndex::deindex) on removal; the
/// indexes then narrow candidate sets so searches only touch matching
/// profiles. Results and per-node lookups are cached with short TTLs.
#[derive(Debug, Default)]
pub struct DiscoveryIndex {
    by_name: DashMap<String, NodeName>,
    by_type: DashMap<NodeType, BTreeSet<NodeName>>,
    by_capability: DashMap<Capability, BTreeSet<NodeName>>,
    query_cache: QueryCache,
    snapshot_cache: SnapshotCache,
}

impl DiscoveryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index (or re-index) one node
    pub fn index(&self, profile: &NodeProfile) {
        // Updates may change type or capabilities, so clear stale
        // memberships first
        self.deindex(&profile.name);

        self.by_name
            .insert(profile.name.as_str().to_string(), profile.name.clone());
        self.by_type
            .entry(profile.node_type)
            .or_default()
            .insert(profile.name.clone());
        for capability in profile.capabilities.enabled() {
            self.by_capability
                .entry(capability)
                .or_default()
                .insert(profile.name.clone());
        }
        self.snapshot_cache.invalidate(&profile.name);
        trace!(node = %profile.name, "indexed");
    }

    /// Remove one node from every index
    pub fn deindex(&self, name: &NodeName) {
        self.by_name.remove(name.as_str());
        for mut entry in self.by_type.iter_mut() {
            entry.value_mut().remove(name);
        }
        for mut entry in self.by_capability.iter_mut() {
            entry.value_mut().remove(name);
        }
        self.snapshot_cache.invalidate(name);
    }

    /// Exact name lookup
    pub fn lookup_name(&self, name: &str) -> Option<NodeName> {
        self.by_name.get(name).map(|entry| entry.value().clone())
    }

    /// Search the registry, consulting the query cache first
    pub fn search(
        &self,
        directory: &dyn NodeDirectory,
        query: &SearchQuery,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>, DiscoveryError> {
        query.validate()?;

        let key = fingerprint(query, options);
        if let Some(cached) = self.query_cache.get(&key) {
            trace!(fingerprint = %key, "search served from cache");
            return Ok(cached);
        }

        let mut hits: Vec<SearchHit> = self
            .candidates(directory, query)
            .into_iter()
            .filter(|profile| query.matches(profile))
            .filter(|profile| options.permits(profile))
            .map(|profile| SearchHit {
                relevance: relevance(&profile),
                profile,
            })
            .collect();

        sort_hits(&mut hits, options.sort);
        hits.truncate(options.limit);

        debug!(
            results = hits.len(),
            fingerprint = %key,
            "search executed"
        );
        self.query_cache.insert(key, hits.clone());
        Ok(hits)
    }

    /// Candidate profiles, narrowed through an index where possible
    fn candidates(&self, directory: &dyn NodeDirectory, query: &SearchQuery) -> Vec<NodeProfile> {
        let indexed: Option<BTreeSet<NodeName>> = if let Some(node_type) = query.node_type {
            Some(
                self.by_type
                    .get(&node_type)
                    .map(|entry| entry.value().clone())
                    .unwrap_or_default(),
            )
        } else if let Some(Ok(ParsedCapability(capability))) =
            query.capability.as_deref().map(str::parse)
        {
            Some(
                self.by_capability
                    .get(&capability)
                    .map(|entry| entry.value().clone())
                    .unwrap_or_default(),
            )
        } else {
            None
        };

        match indexed {
            Some(names) => names
                .iter()
                .filter_map(|name| directory.profile(name))
                .collect(),
            // Attribute-substring and name-substring queries scan
            None => directory.profiles(),
        }
    }

    /// Direct node lookup through the snapshot cache (30-minute TTL)
    pub fn node_snapshot(
        &self,
        directory: &dyn NodeDirectory,
        name: &NodeName,
    ) -> Option<NodeProfile> {
        if let Some(snapshot) = self.snapshot_cache.get(name) {
            return Some(snapshot);
        }
        let profile = directory.profile(name)?;
        self.snapshot_cache.insert(profile.clone());
        Some(profile)
    }

    /// Prune expired entries from both caches
    pub fn sweep_caches(&self) -> (usize, usize) {
        (self.query_cache.sweep(), self.snapshot_cache.sweep())
    }

    /// Query cache hit/miss counters
    pub fn query_cache_counters(&self) -> CacheCounters {
        self.query_cache.counters()
    }

    /// Snapshot cache hit/miss counters
    pub fn snapshot_cache_counters(&self) -> CacheCounters {
        self.snapshot_cache.counters()
    }
}
