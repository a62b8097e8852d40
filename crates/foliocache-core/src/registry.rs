//! Kind registry: per-resource configuration with discriminator overrides.
//!
//! A kind is the logical name of a content type ("categories", "posts") or a
//! discriminator specializing one ("Skill" is a resume entry with its own
//! fields and forms). The registry is a closed two-level table: resolving a
//! discriminator shallow-merges its overrides onto the parent kind, and
//! resolving an unknown name falls back to the default kind so a
//! misconfigured content type degrades instead of crashing the UI.

use std::collections::HashMap;

use tracing::warn;

/// Presentation/edit strategy names, stored and forwarded to the UI layer.
/// The cache core never interprets these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderHints {
    pub list_view: String,
    pub edit_form: String,
}

impl RenderHints {
    pub fn new(list_view: impl Into<String>, edit_form: impl Into<String>) -> Self {
        Self {
            list_view: list_view.into(),
            edit_form: edit_form.into(),
        }
    }
}

/// Resolved configuration for one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindConfig {
    pub kind: String,
    pub resource_path: String,
    pub query_fields: Vec<String>,
    pub display_name: String,
    pub display_name_plural: String,
    pub render: RenderHints,
}

/// Field-level overrides a discriminator applies to its parent kind.
/// Unset fields inherit; the resource path is always the parent's.
#[derive(Debug, Clone, Default)]
pub struct KindOverrides {
    pub query_fields: Option<Vec<String>>,
    pub display_name: Option<String>,
    pub display_name_plural: Option<String>,
    pub render: Option<RenderHints>,
}

#[derive(Debug)]
struct KindSpec {
    config: KindConfig,
    discriminators: HashMap<String, KindOverrides>,
}

#[derive(Debug)]
pub struct KindRegistry {
    kinds: HashMap<String, KindSpec>,
    default_kind: String,
}

impl KindRegistry {
    /// Registry with the built-in portfolio kinds and resume discriminators.
    pub fn new() -> Self {
        let mut registry = Self {
            kinds: HashMap::new(),
            default_kind: "posts".to_string(),
        };

        registry.register(KindConfig {
            kind: "posts".to_string(),
            resource_path: "/posts".to_string(),
            query_fields: string_vec(&["title", "tags", "category", "published"]),
            display_name: "Post".to_string(),
            display_name_plural: "Posts".to_string(),
            render: RenderHints::new("list/post", "forms/post"),
        });
        registry.register(KindConfig {
            kind: "categories".to_string(),
            resource_path: "/categories".to_string(),
            query_fields: string_vec(&["title", "tags"]),
            display_name: "Category".to_string(),
            display_name_plural: "Categories".to_string(),
            render: RenderHints::new("list/category", "forms/category"),
        });
        registry.register(KindConfig {
            kind: "media".to_string(),
            resource_path: "/media".to_string(),
            query_fields: string_vec(&["title", "tags", "url"]),
            display_name: "Media".to_string(),
            display_name_plural: "Media".to_string(),
            render: RenderHints::new("list/media", "forms/media"),
        });
        registry.register(KindConfig {
            kind: "resumes".to_string(),
            resource_path: "/resumes".to_string(),
            query_fields: string_vec(&["title", "tags", "kind", "order"]),
            display_name: "Resume entry".to_string(),
            display_name_plural: "Resume entries".to_string(),
            render: RenderHints::new("list/resume", "forms/resume"),
        });

        let resume_kinds: [(&str, &[&str]); 5] = [
            ("Skill", &["title", "kind", "level", "order"]),
            ("Experience", &["title", "kind", "company", "from", "to"]),
            ("Education", &["title", "kind", "school", "from", "to"]),
            ("Project", &["title", "kind", "tags", "url"]),
            ("Reference", &["title", "kind", "company"]),
        ];
        for (name, fields) in resume_kinds {
            registry.register_discriminator(
                "resumes",
                name,
                KindOverrides {
                    query_fields: Some(string_vec(fields)),
                    display_name: Some(name.to_string()),
                    display_name_plural: Some(format!("{}s", name)),
                    render: Some(RenderHints::new(
                        format!("list/{}", name.to_lowercase()),
                        format!("forms/{}", name.to_lowercase()),
                    )),
                },
            );
        }

        registry
    }

    /// Register (or replace) a top-level kind.
    pub fn register(&mut self, config: KindConfig) {
        self.kinds.insert(
            config.kind.clone(),
            KindSpec {
                config,
                discriminators: HashMap::new(),
            },
        );
    }

    /// Register a discriminator under an existing top-level kind.
    /// Returns false (and logs) when the parent is unknown.
    pub fn register_discriminator(
        &mut self,
        parent: &str,
        name: &str,
        overrides: KindOverrides,
    ) -> bool {
        match self.kinds.get_mut(parent) {
            Some(spec) => {
                spec.discriminators.insert(name.to_string(), overrides);
                true
            }
            None => {
                warn!(parent = %parent, name = %name, "cannot register discriminator under unknown kind");
                false
            }
        }
    }

    /// Resolve a kind name to its effective configuration.
    ///
    /// Top-level kinds resolve directly; discriminators merge onto their
    /// parent; unknown names resolve to the default kind.
    pub fn resolve(&self, kind: &str) -> KindConfig {
        if let Some(spec) = self.kinds.get(kind) {
            return spec.config.clone();
        }

        for spec in self.kinds.values() {
            if let Some(overrides) = spec.discriminators.get(kind) {
                return merge(&spec.config, kind, overrides);
            }
        }

        warn!(kind = %kind, fallback = %self.default_kind, "unknown kind, using default");
        self.default_config()
    }

    pub fn default_kind(&self) -> &str {
        &self.default_kind
    }

    /// Change which kind unknown names resolve to.
    /// Ignored (with a log) when the kind is not registered.
    pub fn set_default_kind(&mut self, kind: &str) {
        if self.kinds.contains_key(kind) {
            self.default_kind = kind.to_string();
        } else {
            warn!(kind = %kind, "cannot default to unregistered kind");
        }
    }

    fn default_config(&self) -> KindConfig {
        match self.kinds.get(&self.default_kind) {
            Some(spec) => spec.config.clone(),
            // Unreachable through the public API: the default kind is set in
            // the constructor and set_default_kind refuses unknown names.
            None => KindConfig {
                kind: self.default_kind.clone(),
                resource_path: format!("/{}", self.default_kind),
                query_fields: string_vec(&["title"]),
                display_name: self.default_kind.clone(),
                display_name_plural: self.default_kind.clone(),
                render: RenderHints::new("list/default", "forms/default"),
            },
        }
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn merge(parent: &KindConfig, kind: &str, overrides: &KindOverrides) -> KindConfig {
    KindConfig {
        kind: kind.to_string(),
        resource_path: parent.resource_path.clone(),
        query_fields: overrides
            .query_fields
            .clone()
            .unwrap_or_else(|| parent.query_fields.clone()),
        display_name: overrides
            .display_name
            .clone()
            .unwrap_or_else(|| parent.display_name.clone()),
        display_name_plural: overrides
            .display_name_plural
            .clone()
            .unwrap_or_else(|| parent.display_name_plural.clone()),
        render: overrides
            .render
            .clone()
            .unwrap_or_else(|| parent.render.clone()),
    }
}

fn string_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_top_level_kind() {
        let registry = KindRegistry::new();
        let config = registry.resolve("categories");
        assert_eq!(config.resource_path, "/categories");
        assert_eq!(config.display_name_plural, "Categories");
    }

    #[test]
    fn test_discriminator_merges_over_parent() {
        let registry = KindRegistry::new();
        let skill = registry.resolve("Skill");

        // Overridden fields win, the resource path is inherited.
        assert_eq!(skill.kind, "Skill");
        assert_eq!(skill.resource_path, "/resumes");
        assert!(skill.query_fields.contains(&"level".to_string()));
        assert_eq!(skill.render.edit_form, "forms/skill");
    }

    #[test]
    fn test_discriminator_inherits_unset_fields() {
        let mut registry = KindRegistry::new();
        registry.register_discriminator("resumes", "Award", KindOverrides::default());

        let award = registry.resolve("Award");
        assert_eq!(award.kind, "Award");
        assert_eq!(award.resource_path, "/resumes");
        assert_eq!(award.render, registry.resolve("resumes").render);
    }

    #[test]
    fn test_unknown_kind_falls_back_to_default() {
        let registry = KindRegistry::new();
        let config = registry.resolve("no-such-kind");
        assert_eq!(config.kind, "posts");
    }

    #[test]
    fn test_discriminator_under_unknown_parent_is_rejected() {
        let mut registry = KindRegistry::new();
        assert!(!registry.register_discriminator("widgets", "Gauge", KindOverrides::default()));
    }

    #[test]
    fn test_set_default_kind() {
        let mut registry = KindRegistry::new();
        registry.set_default_kind("categories");
        assert_eq!(registry.resolve("???").kind, "categories");

        registry.set_default_kind("nope");
        assert_eq!(registry.default_kind(), "categories");
    }
}
