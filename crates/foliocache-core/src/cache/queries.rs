//! Query-result cache keyed on canonical query signatures.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::models::Pagination;
use crate::query::Query;

use super::CacheEntry;

/// Maximum cached query results before batch eviction kicks in.
pub const MAX_QUERIES: usize = 100;

/// Seconds a cached query result stays servable.
/// Content edits land through this same client, which invalidates eagerly;
/// 20s only bounds staleness against edits made elsewhere.
pub const QUERY_TTL_SECS: i64 = 20;

#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    pub ttl: Duration,
    pub max_queries: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(QUERY_TTL_SECS),
            max_queries: MAX_QUERIES,
        }
    }
}

#[derive(Debug)]
pub struct QueryCache {
    pub(crate) entries: HashMap<String, CacheEntry>,
    options: CacheOptions,
    seq: u64,
}

impl QueryCache {
    pub fn new(options: CacheOptions) -> Self {
        Self {
            entries: HashMap::new(),
            options,
            seq: 0,
        }
    }

    /// Cache key for a query against a resource. Identical queries in
    /// different filter order collide to the same key, and the same string
    /// doubles as the transport request path.
    pub fn key(resource_path: &str, query: &Query) -> String {
        let canonical = query.canonical();
        if canonical.is_empty() {
            resource_path.to_string()
        } else {
            format!("{}?{}", resource_path, canonical)
        }
    }

    /// Look up a fresh entry; anything at or past the TTL is absent.
    pub fn lookup(&self, key: &str) -> Option<&CacheEntry> {
        let entry = self.entries.get(key)?;
        if entry.is_expired(self.options.ttl) {
            debug!(key = %key, age_ms = entry.age().num_milliseconds(), "cached query expired");
            return None;
        }
        Some(entry)
    }

    /// Record a query result (or a failure) under its key.
    pub fn put(
        &mut self,
        key: String,
        ids: Vec<String>,
        pagination: Option<Pagination>,
        error: Option<String>,
        warning: Option<String>,
    ) {
        self.seq += 1;
        let entry = CacheEntry {
            ids,
            cached_at: Utc::now(),
            seq: self.seq,
            pagination,
            error,
            warning,
        };
        self.entries.insert(key, entry);
        self.evict_if_over_capacity();
    }

    /// Coarse invalidation: drop every cached query.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            debug!(dropped = self.entries.len(), "invalidating all cached queries");
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Batch eviction: once over capacity, drop the oldest half by
    /// timestamp, insertion order breaking ties. Cheaper than strict LRU
    /// and good enough at this cache size.
    fn evict_if_over_capacity(&mut self) {
        if self.entries.len() <= self.options.max_queries {
            return;
        }

        let mut order: Vec<(String, DateTime<Utc>, u64)> = self
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.cached_at, entry.seq))
            .collect();
        order.sort_by(|a, b| (a.1, a.2).cmp(&(b.1, b.2)));

        let drop_count = self.entries.len() / 2;
        for (key, _, _) in order.into_iter().take(drop_count) {
            self.entries.remove(&key);
        }
        debug!(dropped = drop_count, remaining = self.entries.len(), "evicted oldest cached queries");
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}
