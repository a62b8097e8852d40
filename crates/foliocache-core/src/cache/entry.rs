use chrono::{DateTime, Duration, Utc};

use crate::models::Pagination;

/// Cached result of one query: entity ID references plus metadata.
///
/// Failed fetches are cached too, with `error` set and no IDs, so retry
/// bursts against a known-failing query stay off the backend until the entry
/// expires.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub ids: Vec<String>,
    pub cached_at: DateTime<Utc>,
    /// Insertion counter, breaks timestamp ties during eviction.
    pub(crate) seq: u64,
    pub pagination: Option<Pagination>,
    pub error: Option<String>,
    pub warning: Option<String>,
}

impl CacheEntry {
    pub fn age(&self) -> Duration {
        Utc::now() - self.cached_at
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
