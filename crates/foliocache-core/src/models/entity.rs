//! Content entities in a schema-tolerant wire format.
//!
//! Every resource kind (categories, posts, media, resume entries) shares the
//! same envelope: a stable `id` once persisted, a `title`, optional `tags`,
//! an optional `kind` discriminator, and whatever other fields the backend
//! stores, kept verbatim in `extra` so records round-trip unchanged.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Shared in-memory handle for an entity.
///
/// The entity store hands out clones of the same `Arc` for a given ID, so
/// every holder observes updates without refetching.
pub type SharedEntity = Arc<RwLock<Entity>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Absent until the backend has persisted the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Discriminator tag selecting which kind configuration applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Backend fields the cache does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_kind(title: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: Some(kind.into()),
            ..Default::default()
        }
    }

    /// An entity without an identifier has not been persisted yet.
    pub fn is_draft(&self) -> bool {
        self.id.is_none()
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.extra.insert(name.into(), value);
    }

    /// Wrap in a fresh shared handle (used for drafts not yet in the store).
    pub fn into_shared(self) -> SharedEntity {
        Arc::new(RwLock::new(self))
    }
}

/// Page metadata returned alongside list responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_roundtrips_unknown_fields() {
        let raw = json!({
            "id": "c1",
            "title": "Painting",
            "tags": ["art"],
            "kind": "categories",
            "color": "#aa3311",
            "order": 4
        });

        let entity: Entity = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(entity.id.as_deref(), Some("c1"));
        assert_eq!(entity.field("color"), Some(&json!("#aa3311")));

        let back = serde_json::to_value(&entity).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_draft_skips_id_on_serialize() {
        let draft = Entity::new("Untitled");
        assert!(draft.is_draft());

        let value = serde_json::to_value(&draft).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("tags").is_none());
    }

    #[test]
    fn test_set_field_overwrites() {
        let mut entity = Entity::new("Post");
        entity.set_field("published", json!(false));
        entity.set_field("published", json!(true));
        assert_eq!(entity.field("published"), Some(&json!(true)));
    }
}
