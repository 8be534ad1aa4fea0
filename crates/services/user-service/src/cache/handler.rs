//! Per-key view over the cache store.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use common::{AppError, AppResult};

use super::store::CacheStore;

/// Binds one key and a default TTL to the shared [`CacheStore`].
///
/// Values are stored as JSON, so anything `Serialize + DeserializeOwned`
/// round-trips.
#[derive(Clone)]
pub struct CacheHandler {
    store: Arc<CacheStore>,
    key: String,
    ttl_seconds: Option<u64>,
}

impl CacheHandler {
    pub fn new(store: Arc<CacheStore>, key: impl Into<String>, ttl_seconds: Option<u64>) -> Self {
        Self {
            store,
            key: key.into(),
            ttl_seconds,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Store `value` under the bound key. `ttl_override` wins over the bound
    /// TTL; with neither present this is a configuration error.
    pub async fn set_value<T>(&self, value: &T, ttl_override: Option<u64>) -> AppResult<()>
    where
        T: Serialize + ?Sized,
    {
        let ttl = ttl_override.or(self.ttl_seconds).ok_or_else(|| {
            AppError::configuration(format!("no TTL configured for cache key {}", self.key))
        })?;
        let bytes = serde_json::to_vec(value)?;
        self.store.set_value(&self.key, bytes, ttl).await
    }

    pub async fn get_value<T: DeserializeOwned>(&self) -> AppResult<Option<T>> {
        match self.store.get_value(&self.key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Write and read back a sentinel value under the bound key. Never fails.
    pub async fn is_alive(&self) -> bool {
        const SENTINEL: i64 = 100;
        if self.set_value(&SENTINEL, None).await.is_err() {
            return false;
        }
        matches!(self.get_value::<i64>().await, Ok(Some(SENTINEL)))
    }
}
