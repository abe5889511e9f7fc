//! Redis cache store implementation

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use tracing::{debug, warn};

use crate::domain::DomainError;
use crate::domain::cache::{CacheEntry, CacheStore};

const ENTRY_FIELD: &str = "entry";
const HIT_COUNT_FIELD: &str = "hit_count";

/// Increment the hit counter only while the key exists, never resurrecting it
static TOUCH_HIT_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        if redis.call('EXISTS', KEYS[1]) == 1 then
            return redis.call('HINCRBY', KEYS[1], ARGV[1], 1)
        end
        return false
        "#,
    )
});

/// Delete the key only if its `entry` field still holds the value that was read
static DISCARD_IF_UNCHANGED_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        if redis.call('HGET', KEYS[1], ARGV[1]) == ARGV[2] then
            return redis.call('DEL', KEYS[1])
        end
        return 0
        "#,
    )
});

/// Configuration for the Redis cache store
#[derive(Debug, Clone)]
pub struct RedisCacheStoreConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key namespace
    pub namespace: String,
}

impl Default for RedisCacheStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            namespace: "semcache".to_string(),
        }
    }
}

impl RedisCacheStoreConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

/// Durable cache store backed by Redis
///
/// Each entry is a hash `{namespace}:entry:{token}` holding the serialized
/// entry and its hit counter. Expiry is enforced natively by Redis, so the
/// entry and its counter disappear together.
#[derive(Clone)]
pub struct RedisCacheStore {
    connection: ConnectionManager,
    config: RedisCacheStoreConfig,
}

impl fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

fn unavailable(action: &str, error: redis::RedisError) -> DomainError {
    DomainError::store_unavailable(format!("Redis {} failed: {}", action, error))
}

impl RedisCacheStore {
    /// Creates a new Redis cache store connection
    pub async fn new(config: RedisCacheStoreConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::configuration(format!("Invalid Redis URL: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| unavailable("connect", e))?;

        Ok(Self { connection, config })
    }

    fn entry_key(&self, identity_token: &str) -> String {
        entry_key(&self.config.namespace, identity_token)
    }

    async fn scan_entry_keys(&self) -> Result<Vec<String>, DomainError> {
        let pattern = self.entry_key("*");
        let mut conn = self.connection.clone();
        let mut cursor = 0u64;
        let mut all_keys = Vec::new();

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(1000)
                .query_async(&mut conn)
                .await
                .map_err(|e| unavailable("scan", e))?;

            all_keys.extend(keys);
            cursor = new_cursor;

            if cursor == 0 {
                break;
            }
        }

        Ok(all_keys)
    }

    /// Delete `key` unless a concurrent `put` replaced the entry read as `json`
    async fn discard_if_unchanged(&self, key: &str, json: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let deleted: i64 = DISCARD_IF_UNCHANGED_SCRIPT
            .key(key)
            .arg(ENTRY_FIELD)
            .arg(json)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| unavailable("delete", e))?;

        Ok(deleted > 0)
    }
}

fn entry_key(namespace: &str, identity_token: &str) -> String {
    format!("{}:entry:{}", namespace, identity_token)
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, identity_token: &str) -> Result<Option<CacheEntry>, DomainError> {
        let key = self.entry_key(identity_token);
        let mut conn = self.connection.clone();

        let (json, hits): (Option<String>, Option<u64>) = redis::cmd("HMGET")
            .arg(&key)
            .arg(ENTRY_FIELD)
            .arg(HIT_COUNT_FIELD)
            .query_async(&mut conn)
            .await
            .map_err(|e| unavailable("get", e))?;

        let Some(json) = json else {
            return Ok(None);
        };

        let entry: CacheEntry = match serde_json::from_str(&json) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(identity_token = %identity_token, error = %e, "Discarding undecodable cache entry");
                self.discard_if_unchanged(&key, &json).await?;
                return Ok(None);
            }
        };

        // Redis expiry has millisecond precision; the entry's own deadline is authoritative
        if entry.is_expired() {
            if self.discard_if_unchanged(&key, &json).await? {
                debug!(identity_token = %identity_token, "Removed expired cache entry on read");
            }
            return Ok(None);
        }

        Ok(Some(entry.with_hit_count(hits.unwrap_or(0))))
    }

    async fn put(&self, entry: CacheEntry, ttl: Duration) -> Result<(), DomainError> {
        let entry = entry.expiring_in(ttl);
        let key = self.entry_key(entry.identity_token());
        let hits = entry.hit_count().to_string();
        let json = serde_json::to_string(&entry)
            .map_err(|e| DomainError::internal(format!("Failed to serialize entry: {}", e)))?;
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);

        let mut conn = self.connection.clone();

        redis::pipe()
            .atomic()
            .del(&key)
            .ignore()
            .hset_multiple(&key, &[(ENTRY_FIELD, json.as_str()), (HIT_COUNT_FIELD, hits.as_str())])
            .ignore()
            .pexpire(&key, ttl_ms)
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| unavailable("put", e))?;

        Ok(())
    }

    async fn touch_hit(&self, identity_token: &str) -> Result<Option<u64>, DomainError> {
        let key = self.entry_key(identity_token);
        let mut conn = self.connection.clone();

        TOUCH_HIT_SCRIPT
            .key(&key)
            .arg(HIT_COUNT_FIELD)
            .invoke_async::<Option<u64>>(&mut conn)
            .await
            .map_err(|e| unavailable("touch_hit", e))
    }

    async fn invalidate(&self, identity_token: &str) -> Result<bool, DomainError> {
        let key = self.entry_key(identity_token);
        let mut conn = self.connection.clone();

        let deleted: i64 = conn.del(&key).await.map_err(|e| unavailable("invalidate", e))?;

        Ok(deleted > 0)
    }

    async fn sweep_expired(&self) -> Result<usize, DomainError> {
        // Redis reclaims expired keys itself
        Ok(0)
    }

    async fn size(&self) -> Result<usize, DomainError> {
        Ok(self.scan_entry_keys().await?.len())
    }

    async fn clear(&self) -> Result<(), DomainError> {
        let keys = self.scan_entry_keys().await?;

        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection.clone();
        let _: i64 = conn.del(&keys).await.map_err(|e| unavailable("clear", e))?;

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
