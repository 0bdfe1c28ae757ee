//! Redis client with JSON-encoded values.
//!
//! Reads never fail: a Redis outage or an entry that no longer decodes is
//! treated as a miss, so callers fall through to Postgres. Writes and
//! deletes report errors; the [`invalidate`](crate::invalidate) helpers log
//! and swallow them.
//!
//! ```ignore
//! let cache = RedisCache::connect(&CacheConfig::from_env()).await?;
//! cache.set(&keys::schools::by_id(school.id), &school).await?;
//! let hit: Option<School> = cache.get(&keys::schools::by_id(school.id)).await;
//! ```

use std::time::Duration;

use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};

use crate::CacheConfig;

/// Error type for cache writes and connection setup.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Redis cache client.
///
/// Cheap to clone; clones share one multiplexed, auto-reconnecting connection.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    default_ttl: Duration,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl RedisCache {
    /// Connects to `config.redis_url`.
    ///
    /// # Arguments
    ///
    /// * `config` - URL and default TTL, usually from [`CacheConfig::from_env`]
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Redis`] if the URL is invalid or the server is
    /// unreachable.
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let client = Client::open(config.redis_url.as_str())?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self {
            conn,
            default_ttl: config.default_ttl(),
        })
    }

    /// Returns the cached value, treating Redis and decoding errors as misses.
    #[instrument(skip(self), fields(cache.operation = "GET"))]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.conn.clone();

        let raw: Option<String> = match conn.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(cache.key = %key, error = %e, "Redis GET failed");
                return None;
            }
        };

        let Some(raw) = raw else {
            debug!(cache.key = %key, "Cache miss");
            return None;
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(cache.key = %key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(cache.key = %key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Stores `value` as JSON under `key` with the default TTL.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Serialization`] if `value` cannot be encoded and
    /// [`CacheError::Redis`] if the write fails.
    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(value)?;

        conn.set_ex::<_, _, ()>(key, json, self.default_ttl.as_secs())
            .await?;
        Ok(())
    }

    /// Removes one key; deleting a missing key succeeds.
    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    /// Deletes every key matching a glob `pattern`, walking the keyspace with SCAN.
    ///
    /// Used to drop all cached list pages of a resource at once. Returns the
    /// number of keys removed.
    ///
    /// # Example
    ///
    /// ```ignore
    /// cache.delete_matching(&keys::schools::list_pattern()).await?;
    /// ```
    #[instrument(skip(self), fields(cache.operation = "SCAN_DEL"))]
    pub async fn delete_matching(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                deleted += conn.del::<_, u64>(&keys).await?;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        debug!(cache.pattern = %pattern, cache.deleted = deleted, "Pattern deleted");
        Ok(deleted)
    }
}
