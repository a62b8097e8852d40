//! In-memory caching layers.
//!
//! Two maps with one invariant between them:
//!
//! - `EntityStore`: the single canonical copy of every entity fetched this
//!   session, indexed by ID
//! - `QueryCache`: query results as time-bounded lists of entity IDs,
//!   never entity bodies
//!
//! A cached query is only as good as its IDs: if one no longer resolves in
//! the store, the entry is treated as a miss rather than served stale.

pub mod entry;
pub mod queries;
pub mod store;

pub use entry::CacheEntry;
pub use queries::{CacheOptions, QueryCache, MAX_QUERIES, QUERY_TTL_SECS};
pub use store::EntityStore;
