use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    skip::SkipRules, DYNAMIC_CACHE_NAME, OFFLINE_PAGE, PRECACHE_MANIFEST, STATIC_CACHE_NAME,
};

/// The two live cache partitions of a worker version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheNames {
    pub static_cache: String,
    pub dynamic_cache: String,
}

impl CacheNames {
    pub fn new<S: Into<String>, D: Into<String>>(static_cache: S, dynamic_cache: D) -> Self {
        Self {
            static_cache: static_cache.into(),
            dynamic_cache: dynamic_cache.into(),
        }
    }

    /// True for either live partition. Everything else is stale.
    pub fn is_live(&self, name: &str) -> bool {
        name == self.static_cache || name == self.dynamic_cache
    }
}

impl Default for CacheNames {
    fn default() -> Self {
        Self::new(STATIC_CACHE_NAME, DYNAMIC_CACHE_NAME)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("static and dynamic caches share the name {0:?}")]
    SameCacheNames(String),
    #[error("precache manifest is empty")]
    EmptyPrecache,
    #[error("offline page {0:?} is not in the precache manifest")]
    OfflinePageNotPrecached(String),
}

/// Immutable configuration of one worker version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub caches: CacheNames,
    pub precache: Vec<String>,
    pub offline_page: String,
    #[serde(default)]
    pub skip: SkipRules,
}

impl WorkerConfig {
    /// The version reported to pages, which is the static cache name
    pub fn version(&self) -> &str {
        &self.caches.static_cache
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.caches.static_cache == self.caches.dynamic_cache {
            return Err(ConfigError::SameCacheNames(self.caches.static_cache.clone()));
        }
        if self.precache.is_empty() {
            return Err(ConfigError::EmptyPrecache);
        }
        if !self.precache.iter().any(|p| p == &self.offline_page) {
            return Err(ConfigError::OfflinePageNotPrecached(self.offline_page.clone()));
        }
        Ok(())
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            caches: CacheNames::default(),
            precache: PRECACHE_MANIFEST.iter().map(|p| p.to_string()).collect(),
            offline_page: OFFLINE_PAGE.to_string(),
            skip: SkipRules::default(),
        }
    }
}
