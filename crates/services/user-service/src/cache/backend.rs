//! Cache backends: Redis for deployments, DashMap for local runs and tests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use tracing::debug;

use common::AppResult;

/// Byte-level key/value storage with per-key expiry.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch the raw bytes stored under `key`, `None` on a miss.
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, expiring after `ttl_seconds`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> AppResult<()>;

    /// Remove the given keys, returning how many existed.
    async fn delete(&self, keys: &[String]) -> AppResult<u64>;

    /// Every live key.
    async fn keys(&self) -> AppResult<Vec<String>>;
}

// =============================================================================
// Redis
// =============================================================================

/// Redis backend over a multiplexed, auto-reconnecting connection.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    /// Connect to Redis.
    pub async fn connect(url: &str) -> AppResult<Self> {
        debug!("Connecting to Redis");
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> AppResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let deleted: u64 = conn.del(keys).await?;
        Ok(deleted)
    }

    async fn keys(&self) -> AppResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys("*").await?;
        Ok(keys)
    }
}

// =============================================================================
// In-memory
// =============================================================================

struct Entry {
    data: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Process-local backend. Expired entries are dropped when touched and are
/// never listed.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, Entry>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        if let Some(entry) = self.store.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.data.clone()));
            }
        }
        // A concurrent `set` may have replaced the stale entry by now.
        self.store.remove_if(key, |_, entry| entry.is_expired());
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> AppResult<()> {
        let entry = Entry {
            data: value,
            expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
        };
        self.store.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> AppResult<u64> {
        let removed = keys
            .iter()
            .filter_map(|key| self.store.remove(key))
            .filter(|(_, entry)| !entry.is_expired())
            .count();
        Ok(removed as u64)
    }

    async fn keys(&self) -> AppResult<Vec<String>> {
        self.store.retain(|_, entry| !entry.is_expired());
        Ok(self.store.iter().map(|entry| entry.key().clone()).collect())
    }
}
