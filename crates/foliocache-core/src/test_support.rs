//! Scripted transport double for service and item tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use crate::api::{ApiError, ApiResponse, Transport};
use crate::models::Entity;

enum Scripted {
    Respond(ApiResponse),
    NetworkFailure(String),
}

/// Transport double serving queued responses and recording every call.
/// An exhausted script answers with an empty success envelope.
pub(crate) struct MockTransport {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn push_ok(&self, response: ApiResponse) {
        self.lock_script().push_back(Scripted::Respond(response));
    }

    pub fn push_entities(&self, content: Vec<Entity>) {
        self.push_ok(ApiResponse {
            content,
            ..Default::default()
        });
    }

    pub fn push_error(&self, message: &str) {
        self.push_ok(ApiResponse::from_error(message));
    }

    pub fn push_network_failure(&self, message: &str) {
        self.lock_script()
            .push_back(Scripted::NetworkFailure(message.to_string()));
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.lock_calls().clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    fn answer(&self, method: &str, path: &str) -> Result<ApiResponse> {
        self.lock_calls().push((method.to_string(), path.to_string()));
        match self.lock_script().pop_front() {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::NetworkFailure(message)) => {
                Err(ApiError::InvalidResponse(message).into())
            }
            None => Ok(ApiResponse::default()),
        }
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Scripted>> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<(String, String)>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.answer("GET", path)
    }

    async fn post(&self, path: &str, _body: &Entity) -> Result<ApiResponse> {
        self.answer("POST", path)
    }

    async fn patch(&self, path: &str, _body: &Entity) -> Result<ApiResponse> {
        self.answer("PATCH", path)
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.answer("DELETE", path)
    }
}

/// One persisted entity.
pub(crate) fn entity(id: &str, title: &str) -> Entity {
    Entity {
        id: Some(id.to_string()),
        title: title.to_string(),
        ..Default::default()
    }
}

/// A batch of persisted entities from (id, title) pairs.
pub(crate) fn entities(specs: &[(&str, &str)]) -> Vec<Entity> {
    specs.iter().map(|(id, title)| entity(id, title)).collect()
}
