//! Per-entity handle bound to one cache service.
//!
//! An `Item` is what the UI holds: the shared entity record, the resolved
//! render strategy for its kind, and save/delete operations that delegate to
//! the owning service. Its loading/error/warning fields mirror only this
//! entity's last operation, independent of the service-wide status.

use std::sync::{Arc, Weak};

use anyhow::Result;

use crate::cache::store::{read_entity, write_entity};
use crate::models::{Entity, SharedEntity};
use crate::registry::RenderHints;
use crate::service::CacheService;

pub struct Item {
    service: Weak<CacheService>,
    entity: SharedEntity,
    render: RenderHints,
    loading: bool,
    error: Option<String>,
    warning: Option<String>,
}

impl std::fmt::Debug for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Item")
            .field("id", &self.id())
            .field("title", &self.title())
            .field("loading", &self.loading)
            .field("error", &self.error)
            .finish()
    }
}

impl Item {
    pub(crate) fn new(service: Weak<CacheService>, entity: SharedEntity, render: RenderHints) -> Self {
        Self {
            service,
            entity,
            render,
            loading: false,
            error: None,
            warning: None,
        }
    }

    pub fn id(&self) -> Option<String> {
        read_entity(&self.entity).id.clone()
    }

    pub fn title(&self) -> String {
        read_entity(&self.entity).title.clone()
    }

    pub fn kind(&self) -> Option<String> {
        read_entity(&self.entity).kind.clone()
    }

    /// Copy of the entity's current state.
    pub fn snapshot(&self) -> Entity {
        read_entity(&self.entity).clone()
    }

    /// Presentation/edit strategy resolved for this entity's kind.
    pub fn render(&self) -> &RenderHints {
        &self.render
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// Apply local edits before a save.
    pub fn edit(&self, apply: impl FnOnce(&mut Entity)) {
        apply(&mut *write_entity(&self.entity));
    }

    /// Persist the entity's current state through the owning service.
    ///
    /// Drafts are created (the service redirects an ID-less update to
    /// create) and this handle rebinds to the stored record so the assigned
    /// ID is visible afterwards.
    pub async fn save(&mut self) -> Result<()> {
        let service = self.require_service()?;
        self.loading = true;
        self.error = None;
        self.warning = None;

        let snapshot = self.snapshot();
        let result = service.update_item(snapshot).await;
        self.loading = false;

        match result {
            Ok(saved) => {
                self.entity = saved.into_shared();
                self.warning = service.status().warning;
                Ok(())
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Delete the entity through the owning service.
    pub async fn delete(&mut self) -> Result<()> {
        let service = self.require_service()?;
        let Some(id) = self.id() else {
            let message = "cannot delete an unsaved entry".to_string();
            self.error = Some(message.clone());
            anyhow::bail!(message);
        };

        self.loading = true;
        self.error = None;
        self.warning = None;

        let result = service.delete_item(&id).await;
        self.loading = false;

        match result {
            Ok(()) => {
                self.warning = service.status().warning;
                Ok(())
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn require_service(&mut self) -> Result<Arc<CacheService>> {
        match self.service.upgrade() {
            Some(service) => Ok(service),
            None => {
                let message = "cache service is no longer alive".to_string();
                self.error = Some(message.clone());
                Err(anyhow::anyhow!(message))
            }
        }
    }

    pub(crate) fn into_shared(self) -> SharedEntity {
        self.entity
    }
}
