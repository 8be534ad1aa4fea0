//! Process-wide cache store.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use common::{AppResult, CacheConfig};

use super::backend::{CacheBackend, InMemoryBackend, RedisBackend};

/// Reserved key written by the liveness check.
pub const LIVENESS_KEY: &str = "test_key";
const LIVENESS_VALUE: &[u8] = b"100";
const LIVENESS_TTL_SECONDS: u64 = 30;

/// Key/value store shared by every cache handler.
///
/// The backend is attached once at startup and detached at shutdown. While no
/// backend is attached (never started, caching disabled, or closed) every
/// write is dropped and every read misses.
#[derive(Default)]
pub struct CacheStore {
    backend: RwLock<Option<Arc<dyn CacheBackend>>>,
}

impl CacheStore {
    /// Store with no backend attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with an already-built backend attached.
    pub fn with_backend(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend: RwLock::new(Some(backend)),
        }
    }

    /// Attach the backend described by `config`.
    pub async fn start_up(&self, config: &CacheConfig) -> AppResult<()> {
        if !config.enabled {
            info!("Caching disabled");
            return Ok(());
        }

        let backend: Arc<dyn CacheBackend> = if config.is_in_memory() {
            Arc::new(InMemoryBackend::new())
        } else {
            Arc::new(RedisBackend::connect(&config.url).await?)
        };

        *self.backend.write().await = Some(backend);
        info!(in_memory = config.is_in_memory(), "Cache store started");
        Ok(())
    }

    /// Detach the backend. Safe to call more than once.
    pub async fn close(&self) {
        if self.backend.write().await.take().is_some() {
            info!("Cache store closed");
        }
    }

    pub async fn is_enabled(&self) -> bool {
        self.backend.read().await.is_some()
    }

    async fn backend(&self) -> Option<Arc<dyn CacheBackend>> {
        self.backend.read().await.clone()
    }

    pub async fn set_value(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> AppResult<()> {
        match self.backend().await {
            Some(backend) => {
                debug!(key, ttl_seconds, "Cache set");
                backend.set(key, value, ttl_seconds).await
            }
            None => Ok(()),
        }
    }

    pub async fn get_value(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        match self.backend().await {
            Some(backend) => backend.get(key).await,
            None => Ok(None),
        }
    }

    /// Remove every key, returning how many were deleted.
    pub async fn delete_all_keys(&self) -> AppResult<u64> {
        let Some(backend) = self.backend().await else {
            return Ok(0);
        };
        let keys = backend.keys().await?;
        let deleted = backend.delete(&keys).await?;
        info!(deleted, "Cache purged");
        Ok(deleted)
    }

    pub async fn list_all_keys(&self) -> AppResult<Vec<String>> {
        match self.backend().await {
            Some(backend) => backend.keys().await,
            None => Ok(Vec::new()),
        }
    }

    /// Round-trip a known value through the backend. Never fails.
    pub async fn is_alive(&self) -> bool {
        let Some(backend) = self.backend().await else {
            return false;
        };
        let round_trip = async {
            backend
                .set(LIVENESS_KEY, LIVENESS_VALUE.to_vec(), LIVENESS_TTL_SECONDS)
                .await?;
            backend.get(LIVENESS_KEY).await
        };
        match round_trip.await {
            Ok(value) => value.as_deref() == Some(LIVENESS_VALUE),
            Err(e) => {
                warn!("Cache liveness check failed: {}", e);
                false
            }
        }
    }
}
