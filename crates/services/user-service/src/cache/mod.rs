//! Caching layer: backends, the shared store, keyed handlers and the
//! read-through request wrapper.

mod backend;
mod decorator;
mod handler;
mod store;

pub use backend::{CacheBackend, InMemoryBackend, RedisBackend};
pub use decorator::{cached_request, CACHED_STATUS};
pub use handler::CacheHandler;
pub use store::{CacheStore, LIVENESS_KEY};
