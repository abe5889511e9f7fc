//! Cache infrastructure - Cache store implementations

mod factory;
mod in_memory;
mod redis;

pub use factory::{CacheBackend, CacheStoreConfig, CacheStoreFactory};
pub use in_memory::{InMemoryCacheStore, InMemoryCacheStoreConfig};
pub use redis::{RedisCacheStore, RedisCacheStoreConfig};
