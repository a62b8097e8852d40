//! Identity-indexed entity store.
//!
//! Holds the single canonical copy of every entity the session has fetched.
//! Upserts mutate the existing record in place, so every `SharedEntity`
//! handle already held by the UI observes the new data.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::models::{Entity, SharedEntity};

#[derive(Debug, Default)]
pub struct EntityStore {
    entities: HashMap<String, SharedEntity>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update each entity with an identifier, returning the
    /// ordered list of IDs processed. Drafts (no ID) cannot be cached by
    /// reference and are skipped.
    pub fn upsert(&mut self, incoming: Vec<Entity>) -> Vec<String> {
        let mut ids = Vec::with_capacity(incoming.len());
        for entity in incoming {
            let Some(id) = entity.id.clone() else {
                debug!(title = %entity.title, "skipping entity without id");
                continue;
            };
            match self.entities.get(&id) {
                Some(existing) => {
                    *write_entity(existing) = entity;
                }
                None => {
                    self.entities
                        .insert(id.clone(), Arc::new(RwLock::new(entity)));
                }
            }
            ids.push(id);
        }
        ids
    }

    pub fn get(&self, id: &str) -> Option<SharedEntity> {
        self.entities.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<SharedEntity> {
        let removed = self.entities.remove(id);
        if removed.is_some() {
            debug!(id = %id, "removed entity from store");
        }
        removed
    }

    /// Snapshot of every live handle, for diagnostics and tests.
    pub fn all(&self) -> Vec<SharedEntity> {
        self.entities.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Take the write guard, recovering from a poisoned lock.
pub(crate) fn write_entity(entity: &RwLock<Entity>) -> std::sync::RwLockWriteGuard<'_, Entity> {
    entity.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Take the read guard, recovering from a poisoned lock.
pub(crate) fn read_entity(entity: &RwLock<Entity>) -> std::sync::RwLockReadGuard<'_, Entity> {
    entity.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, title: &str) -> Entity {
        Entity {
            id: Some(id.to_string()),
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_upsert_returns_ordered_ids() {
        let mut store = EntityStore::new();
        let ids = store.upsert(vec![entity("b", "B"), entity("a", "A")]);
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_upsert_mutates_in_place() {
        let mut store = EntityStore::new();
        store.upsert(vec![entity("p1", "First draft")]);

        // A handle obtained before the second upsert sees the new title.
        let handle = store.get("p1").unwrap();
        store.upsert(vec![entity("p1", "Final title")]);

        assert_eq!(read_entity(&handle).title, "Final title");
        assert_eq!(store.len(), 1);
        assert!(Arc::ptr_eq(&handle, &store.get("p1").unwrap()));
    }

    #[test]
    fn test_upsert_skips_drafts() {
        let mut store = EntityStore::new();
        let ids = store.upsert(vec![Entity::new("no id yet"), entity("x", "X")]);
        assert_eq!(ids, vec!["x"]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_drops_handle() {
        let mut store = EntityStore::new();
        store.upsert(vec![entity("gone", "Bye")]);
        assert!(store.remove("gone").is_some());
        assert!(store.get("gone").is_none());
        assert!(store.remove("gone").is_none());
    }
}
