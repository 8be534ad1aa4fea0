//! Read-through wrapper for outbound calls.

use std::future::Future;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use common::AppResult;

use super::handler::CacheHandler;

/// Status reported for a value served from cache.
pub const CACHED_STATUS: u16 = 200;

/// Serve from `handler` when possible, otherwise run `call` and cache its
/// result if the status is 2xx.
///
/// Concurrent misses on the same key each run `call`; the last write wins.
pub async fn cached_request<T, F, Fut>(handler: &CacheHandler, call: F) -> AppResult<(u16, T)>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = AppResult<(u16, T)>>,
{
    if let Some(value) = handler.get_value::<T>().await? {
        debug!(key = handler.key(), "Cache hit");
        return Ok((CACHED_STATUS, value));
    }
    debug!(key = handler.key(), "Cache miss");

    let (status, value) = call().await?;
    if (200..300).contains(&status) {
        handler.set_value(&value, None).await?;
    }
    Ok((status, value))
}
