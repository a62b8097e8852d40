//! Client configuration management.
//!
//! Loads and saves the client settings: the API base URL, the site being
//! edited, and cache tuning overrides. Stored at
//! `~/.config/foliocache/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::cache::CacheOptions;

/// Application name used for the config directory path
const APP_NAME: &str = "foliocache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub site: Option<String>,
    pub query_ttl_seconds: Option<i64>,
    pub max_cached_queries: Option<usize>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Cache tuning for this client, defaults where unset.
    pub fn cache_options(&self) -> CacheOptions {
        let mut options = CacheOptions::default();
        if let Some(seconds) = self.query_ttl_seconds {
            options.ttl = Duration::seconds(seconds);
        }
        if let Some(max_queries) = self.max_cached_queries {
            options.max_queries = max_queries;
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MAX_QUERIES, QUERY_TTL_SECS};

    #[test]
    fn test_cache_options_defaults() {
        let options = Config::default().cache_options();
        assert_eq!(options.ttl, Duration::seconds(QUERY_TTL_SECS));
        assert_eq!(options.max_queries, MAX_QUERIES);
    }

    #[test]
    fn test_cache_options_overrides() {
        let config = Config {
            query_ttl_seconds: Some(5),
            max_cached_queries: Some(25),
            ..Default::default()
        };
        let options = config.cache_options();
        assert_eq!(options.ttl, Duration::seconds(5));
        assert_eq!(options.max_queries, 25);
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let config = Config {
            api_base_url: Some("https://api.example.com".to_string()),
            site: Some("portfolio".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.api_base_url, config.api_base_url);
        assert_eq!(back.site, config.site);
        assert!(back.query_ttl_seconds.is_none());
    }
}
