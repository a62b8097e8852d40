//! Cache service: the orchestrator between the UI and the transport.
//!
//! One service is constructed per resource kind and composes the shared
//! `EntityStore` and `QueryCache`. Reads go cache-first with reconciliation
//! against the store; mutations go to the transport and invalidate the whole
//! query cache on success. Operation state (loading/error/warning) is
//! published on a watch channel so bound UI observes it without polling.
//!
//! There is no request deduplication: overlapping fetches for the same query
//! each hit the transport and the later completion wins the cache entry.
//! In-flight requests are never cancelled; a late response still lands in
//! the shared caches.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::{ApiError, ApiResponse, Transport};
use crate::cache::{CacheOptions, EntityStore, QueryCache};
use crate::item::Item;
use crate::models::{Entity, Pagination, SharedEntity};
use crate::query::Query;
use crate::registry::{KindConfig, KindRegistry};

/// Maximum concurrent fetches during cache warming.
/// Mirrors what a burst of UI panels would issue without flooding the API.
const MAX_CONCURRENT_WARM_FETCHES: usize = 4;

/// Observable operation state. Single writer (the service), read-many.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceStatus {
    pub loading: bool,
    pub error: Option<String>,
    pub warning: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Result of a query read: entity handles plus pagination metadata.
#[derive(Debug)]
pub struct QueryResult {
    pub items: Vec<Item>,
    pub pagination: Option<Pagination>,
}

/// Caches shared by every service of one session.
///
/// Sibling services (e.g. the resume discriminators) are built over the same
/// handles so a mutation through one invalidates the others' cached queries.
#[derive(Clone)]
pub struct SharedState {
    store: Arc<Mutex<EntityStore>>,
    queries: Arc<Mutex<QueryCache>>,
}

impl SharedState {
    pub fn new(options: CacheOptions) -> Self {
        Self {
            store: Arc::new(Mutex::new(EntityStore::new())),
            queries: Arc::new(Mutex::new(QueryCache::new(options))),
        }
    }

    pub(crate) fn store(&self) -> MutexGuard<'_, EntityStore> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn queries(&self) -> MutexGuard<'_, QueryCache> {
        self.queries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}

pub struct CacheService {
    config: KindConfig,
    transport: Arc<dyn Transport>,
    state: SharedState,
    status_tx: watch::Sender<ServiceStatus>,
    /// Handed to items so they can reach back to this service.
    self_ref: Weak<CacheService>,
}

impl CacheService {
    pub fn new(config: KindConfig, transport: Arc<dyn Transport>, state: SharedState) -> Arc<Self> {
        let (status_tx, _) = watch::channel(ServiceStatus::default());
        Arc::new_cyclic(|self_ref| Self {
            config,
            transport,
            state,
            status_tx,
            self_ref: self_ref.clone(),
        })
    }

    /// Convenience constructor resolving the kind through a registry.
    pub fn for_kind(
        registry: &KindRegistry,
        kind: &str,
        transport: Arc<dyn Transport>,
        state: SharedState,
    ) -> Arc<Self> {
        Self::new(registry.resolve(kind), transport, state)
    }

    pub fn config(&self) -> &KindConfig {
        &self.config
    }

    pub fn subscribe(&self) -> watch::Receiver<ServiceStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> ServiceStatus {
        self.status_tx.borrow().clone()
    }

    /// Wrap an entity that has not been persisted yet.
    /// Saving the returned item will create it through this service.
    pub fn draft(&self, entity: Entity) -> Item {
        self.wrap(entity.into_shared())
    }

    /// Handle for an already-cached entity.
    pub fn item(&self, id: &str) -> Option<Item> {
        let handle = self.state.store().get(id)?;
        Some(self.wrap(handle))
    }

    /// Cache-first read of a query result.
    ///
    /// A fresh cached entry is only served when every referenced ID still
    /// resolves in the entity store; otherwise the entry is a miss and the
    /// transport is hit. A fresh cached *error* is returned as an error
    /// without touching the backend.
    pub async fn get_query_result(&self, query: &Query) -> Result<QueryResult> {
        let key = QueryCache::key(&self.config.resource_path, query);

        let cached = self.state.queries().lookup(&key).cloned();
        if let Some(entry) = cached {
            if let Some(error) = entry.error {
                debug!(key = %key, "serving cached error");
                return Err(ApiError::Backend(error).into());
            }
            if let Some(handles) = self.resolve_ids(&entry.ids) {
                debug!(key = %key, items = handles.len(), "query cache hit");
                return Ok(QueryResult {
                    items: self.wrap_all(handles),
                    pagination: entry.pagination,
                });
            }
            debug!(key = %key, "cached ids no longer resolve, treating as miss");
        }

        self.fetch_and_cache(key).await
    }

    /// Fetch a query from the transport, bypassing the cache read.
    /// The result (or the failure) replaces the cached entry for this query;
    /// no other entry is touched.
    pub async fn fetch_items(&self, query: &Query) -> Result<QueryResult> {
        let key = QueryCache::key(&self.config.resource_path, query);
        self.fetch_and_cache(key).await
    }

    /// Prefetch a batch of queries with bounded concurrency.
    /// Returns how many of them succeeded.
    pub async fn warm(&self, queries: Vec<Query>) -> usize {
        let fetches = queries
            .into_iter()
            .map(|query| async move { self.fetch_items(&query).await.is_ok() });
        stream::iter(fetches)
            .buffer_unordered(MAX_CONCURRENT_WARM_FETCHES)
            .filter(|ok| futures::future::ready(*ok))
            .count()
            .await
    }

    pub async fn create_item(&self, entity: Entity) -> Result<Item> {
        self.begin_operation();
        let response = normalize(self.transport.post(&self.config.resource_path, &entity).await);

        if let Some(error) = response.error {
            self.finish_operation(Some(error.clone()), response.warning);
            return Err(ApiError::Backend(error).into());
        }

        let Some(created) = response.content.into_iter().next() else {
            let message = "create returned no entity".to_string();
            self.finish_operation(Some(message.clone()), response.warning);
            return Err(ApiError::InvalidResponse(message).into());
        };

        let handle = self.commit_mutation(created);
        self.finish_operation(None, response.warning);
        match handle {
            Some(handle) => Ok(self.wrap(handle)),
            None => Err(ApiError::InvalidResponse("created entity has no id".to_string()).into()),
        }
    }

    /// Persist an entity's current state.
    /// An entity without an ID cannot be updated and is created instead.
    pub async fn update_item(&self, entity: Entity) -> Result<Item> {
        let Some(id) = entity.id.clone() else {
            debug!(title = %entity.title, "update without id, redirecting to create");
            return self.create_item(entity).await;
        };

        self.begin_operation();
        let path = format!("{}/{}", self.config.resource_path, id);
        let response = normalize(self.transport.patch(&path, &entity).await);

        if let Some(error) = response.error {
            self.finish_operation(Some(error.clone()), response.warning);
            return Err(ApiError::Backend(error).into());
        }

        // Some endpoints echo the updated record, some return an empty
        // envelope; the input is authoritative in the latter case.
        let updated = response.content.into_iter().next().unwrap_or(entity);
        let handle = self.commit_mutation(updated);
        self.finish_operation(None, response.warning);
        match handle {
            Some(handle) => Ok(self.wrap(handle)),
            None => Err(ApiError::InvalidResponse("updated entity has no id".to_string()).into()),
        }
    }

    pub async fn delete_item(&self, id: &str) -> Result<()> {
        self.begin_operation();
        let path = format!("{}/{}", self.config.resource_path, id);
        let response = normalize(self.transport.delete(&path).await);

        if let Some(error) = response.error {
            self.finish_operation(Some(error.clone()), response.warning);
            return Err(ApiError::Backend(error).into());
        }

        self.state.store().remove(id);
        self.state.queries().clear();
        self.finish_operation(None, response.warning);
        Ok(())
    }

    async fn fetch_and_cache(&self, key: String) -> Result<QueryResult> {
        self.begin_operation();
        // The canonical key doubles as the request path.
        let response = normalize(self.transport.get(&key).await);

        if let Some(error) = response.error {
            self.state.queries().put(
                key.clone(),
                Vec::new(),
                None,
                Some(error.clone()),
                response.warning.clone(),
            );
            self.finish_operation(Some(error.clone()), response.warning);
            return Err(ApiError::Backend(error).into());
        }

        let (ids, handles) = {
            let mut store = self.state.store();
            let ids = store.upsert(response.content);
            let handles: Vec<SharedEntity> =
                ids.iter().filter_map(|id| store.get(id)).collect();
            (ids, handles)
        };
        self.state.queries().put(
            key.clone(),
            ids,
            response.pagination,
            None,
            response.warning.clone(),
        );
        debug!(key = %key, items = handles.len(), "query fetched and cached");

        self.finish_operation(None, response.warning);
        Ok(QueryResult {
            items: self.wrap_all(handles),
            pagination: response.pagination,
        })
    }

    /// Upsert one mutated entity and apply coarse invalidation.
    fn commit_mutation(&self, entity: Entity) -> Option<SharedEntity> {
        let handle = {
            let mut store = self.state.store();
            let ids = store.upsert(vec![entity]);
            ids.first().and_then(|id| store.get(id))
        };
        self.state.queries().clear();
        handle
    }

    fn resolve_ids(&self, ids: &[String]) -> Option<Vec<SharedEntity>> {
        let store = self.state.store();
        let mut handles = Vec::with_capacity(ids.len());
        for id in ids {
            handles.push(store.get(id)?);
        }
        Some(handles)
    }

    fn wrap(&self, handle: SharedEntity) -> Item {
        Item::new(self.self_ref.clone(), handle, self.config.render.clone())
    }

    fn wrap_all(&self, handles: Vec<SharedEntity>) -> Vec<Item> {
        handles.into_iter().map(|handle| self.wrap(handle)).collect()
    }

    fn begin_operation(&self) {
        self.status_tx.send_modify(|status| status.loading = true);
    }

    fn finish_operation(&self, error: Option<String>, warning: Option<String>) {
        self.status_tx.send_modify(|status| {
            status.loading = false;
            status.error = error;
            status.warning = warning;
            status.last_updated = Some(Utc::now());
        });
    }
}

/// Convert transport-level failures into the uniform error-bearing shape.
fn normalize(result: Result<ApiResponse>) -> ApiResponse {
    match result {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "transport failure");
            ApiResponse::from_error(err.to_string())
        }
    }
}
