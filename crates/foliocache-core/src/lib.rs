//! foliocache-core - client-side entity and query-result cache for
//! portfolio/resume sites.
//!
//! The library sits between an editor UI and a REST-shaped content API and
//! keeps two coherent in-memory maps per session:
//!
//! - an `EntityStore` deduplicating entities by identity, so the same record
//!   is never represented twice in memory
//! - a `QueryCache` holding query results as time-bounded lists of entity
//!   IDs, reconciled against the store before being served
//!
//! A `CacheService` per resource kind orchestrates the two, talks to the
//! backend through the injected `Transport`, applies coarse invalidation on
//! mutations, and publishes loading/error/warning state on a watch channel.
//! The UI holds `Item` handles, so edits are visible everywhere without
//! refetching. Kind configuration (resource paths, queryable fields, render
//! strategies, discriminator overrides) lives in the `KindRegistry`.

pub mod api;
pub mod cache;
pub mod config;
pub mod item;
pub mod models;
pub mod query;
pub mod registry;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ApiError, ApiResponse, HttpTransport, Transport};
pub use cache::{CacheEntry, CacheOptions, EntityStore, QueryCache, MAX_QUERIES, QUERY_TTL_SECS};
pub use config::Config;
pub use item::Item;
pub use models::{Entity, Pagination, SharedEntity};
pub use query::{Direction, Op, Predicate, Query, Sort};
pub use registry::{KindConfig, KindOverrides, KindRegistry, RenderHints};
pub use service::{CacheService, QueryResult, ServiceStatus, SharedState};
