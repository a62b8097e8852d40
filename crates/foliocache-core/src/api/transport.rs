//! The transport contract between the cache core and the backend.

use anyhow::Result;
use async_trait::async_trait;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::models::{Entity, Pagination};

/// Uniform response envelope for every verb.
///
/// The backend reports domain failures through `error` rather than bare
/// status codes, so a response can carry an error, a warning alongside
/// content, or both pagination and content. Transport-level failures
/// (network, malformed body) surface as `Err` from the trait methods and are
/// normalized by the cache service into this same shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResponse {
    /// One entity or a list, depending on the endpoint; empty when the
    /// response carried none.
    #[serde(default, deserialize_with = "content_one_or_many")]
    pub content: Vec<Entity>,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub warning: Option<String>,

    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl ApiResponse {
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

/// Accept `content` as a single object, an array, or null.
fn content_one_or_many<'de, D>(deserializer: D) -> Result<Vec<Entity>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(de::Error::custom))
            .collect(),
        Some(single) => Ok(vec![
            serde_json::from_value(single).map_err(de::Error::custom)?
        ]),
    }
}

/// REST-shaped transport the cache service is constructed over.
///
/// Implementations must return an `error`-bearing envelope for domain
/// failures and reserve `Err` for transport-level exceptions.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> Result<ApiResponse>;
    async fn post(&self, path: &str, body: &Entity) -> Result<ApiResponse>;
    async fn patch(&self, path: &str, body: &Entity) -> Result<ApiResponse>;
    async fn delete(&self, path: &str) -> Result<ApiResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_accepts_array() {
        let response: ApiResponse = serde_json::from_value(json!({
            "content": [{"id": "a", "title": "A"}, {"id": "b", "title": "B"}],
            "pagination": {"total": 2, "page": 1, "limit": 10, "pages": 1}
        }))
        .unwrap();

        assert_eq!(response.content.len(), 2);
        assert_eq!(response.pagination.unwrap().total, 2);
        assert!(!response.is_err());
    }

    #[test]
    fn test_content_accepts_single_object() {
        let response: ApiResponse = serde_json::from_value(json!({
            "content": {"id": "a", "title": "A"}
        }))
        .unwrap();

        assert_eq!(response.content.len(), 1);
        assert_eq!(response.content[0].id.as_deref(), Some("a"));
    }

    #[test]
    fn test_error_envelope_without_content() {
        let response: ApiResponse = serde_json::from_value(json!({
            "error": "duplicate title"
        }))
        .unwrap();

        assert!(response.content.is_empty());
        assert_eq!(response.error.as_deref(), Some("duplicate title"));
    }

    #[test]
    fn test_null_content_is_empty() {
        let response: ApiResponse =
            serde_json::from_value(json!({ "content": null, "warning": "slow query" })).unwrap();
        assert!(response.content.is_empty());
        assert_eq!(response.warning.as_deref(), Some("slow query"));
    }
}
