//! Cache store trait definition

use std::time::Duration;

use async_trait::async_trait;

use super::CacheEntry;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Exact-match store mapping identity tokens to cached responses
///
/// Implementations must make `put`, `touch_hit` and `invalidate` atomic per
/// token: a concurrent `get` never observes a partially written entry.
/// Backing storage failures are reported as `DomainError::StoreUnavailable`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a live entry; an expired entry is removed and reported as absent
    async fn get(&self, identity_token: &str) -> Result<Option<CacheEntry>, DomainError>;

    /// Store an entry, fixing its lifetime to `ttl` from now
    async fn put(&self, entry: CacheEntry, ttl: Duration) -> Result<(), DomainError>;

    /// Increment the hit counter of a live entry without extending its TTL
    ///
    /// Returns the new count, or `None` when no live entry exists.
    async fn touch_hit(&self, identity_token: &str) -> Result<Option<u64>, DomainError>;

    /// Remove an entry, returning whether one existed
    async fn invalidate(&self, identity_token: &str) -> Result<bool, DomainError>;

    /// Physically remove every expired entry, returning how many were removed
    async fn sweep_expired(&self) -> Result<usize, DomainError>;

    /// Approximate number of stored entries
    async fn size(&self) -> Result<usize, DomainError>;

    /// Remove all entries
    async fn clear(&self) -> Result<(), DomainError>;

    /// Name of the backing storage, for logs and health checks
    fn backend_name(&self) -> &'static str;
}
