//! Application state shared across handlers.

use std::sync::Arc;

use crate::cache::CacheStore;
use crate::config::UserServiceConfig;
use crate::repository::UserRepository;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub cache: Arc<CacheStore>,
    pub config: UserServiceConfig,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        cache: Arc<CacheStore>,
        config: UserServiceConfig,
    ) -> Self {
        Self {
            users,
            cache,
            config,
        }
    }
}
