//! Cache store factory for runtime selection

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::DomainError;
use crate::domain::cache::CacheStore;

use super::in_memory::{InMemoryCacheStore, InMemoryCacheStoreConfig};
use super::redis::{RedisCacheStore, RedisCacheStoreConfig};

/// Supported cache store backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    /// In-memory store using moka
    #[default]
    #[serde(alias = "in_memory")]
    Memory,
    /// Durable Redis store
    Redis,
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::Memory => write!(f, "memory"),
            CacheBackend::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for CacheBackend {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache backend: {}. Valid backends: memory, redis",
                s
            ))),
        }
    }
}

/// Configuration for the cache store factory
#[derive(Debug, Clone, Default)]
pub struct CacheStoreConfig {
    pub backend: CacheBackend,
    /// Redis URL (required for the Redis backend)
    pub redis_url: Option<String>,
    /// Key namespace (Redis only)
    pub namespace: Option<String>,
    /// Entry bound (in-memory only)
    pub max_entries: Option<u64>,
}

impl CacheStoreConfig {
    /// Creates a configuration for the in-memory store
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Creates a configuration for the Redis store
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            backend: CacheBackend::Redis,
            redis_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_max_entries(mut self, max_entries: u64) -> Self {
        self.max_entries = Some(max_entries);
        self
    }
}

/// Factory for creating cache store instances
#[derive(Debug, Default)]
pub struct CacheStoreFactory;

impl CacheStoreFactory {
    /// Creates a cache store based on configuration
    pub async fn create(config: &CacheStoreConfig) -> Result<Arc<dyn CacheStore>, DomainError> {
        match config.backend {
            CacheBackend::Memory => {
                let mut store_config = InMemoryCacheStoreConfig::default();

                if let Some(max) = config.max_entries {
                    store_config = store_config.with_max_entries(max);
                }

                info!(max_entries = ?config.max_entries, "Using in-memory cache store");
                Ok(Arc::new(InMemoryCacheStore::with_config(store_config)))
            }
            CacheBackend::Redis => {
                let url = config.redis_url.clone().ok_or_else(|| {
                    DomainError::configuration("Redis URL is required for the redis cache backend")
                })?;

                let mut redis_config = RedisCacheStoreConfig::new(url);

                if let Some(namespace) = &config.namespace {
                    redis_config = redis_config.with_namespace(namespace.clone());
                }

                info!(namespace = %redis_config.namespace, "Using Redis cache store");
                Ok(Arc::new(RedisCacheStore::new(redis_config).await?))
            }
        }
    }
}
