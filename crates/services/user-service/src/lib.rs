//! User Service Library
//!
//! User CRUD over HTTP, built on a cache store with read-through request
//! caching and transactional repositories over SeaORM.

pub mod api;
pub mod cache;
pub mod clients;
pub mod config;
pub mod infra;
pub mod repository;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::api::{create_router, AppState};
use crate::cache::CacheStore;
use crate::clients::{CountryLookup, DadataClient};
use crate::config::UserServiceConfig;
use crate::infra::{Database, SessionManager};
use crate::repository::{UserRepository, UserStore};

/// Run the HTTP server until Ctrl-C.
///
/// Connects the database (applying pending migrations), attaches the cache
/// backend, serves, and detaches the cache on the way out.
pub async fn run_server(config: UserServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect(&config.database).await?;
    let sessions = SessionManager::new(db.get_connection());

    let cache = Arc::new(CacheStore::new());
    cache.start_up(&config.cache).await?;

    let countries: Arc<dyn CountryLookup> =
        Arc::new(DadataClient::new(&config.dadata, cache.clone())?);
    let users: Arc<dyn UserRepository> = Arc::new(UserStore::new(sessions, countries));

    let addr: SocketAddr = format!("{}:{}", config.service.host, config.service.port).parse()?;
    let app = create_router(AppState::new(users, cache.clone(), config))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(addr).await?;
    info!("User service listening on {}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    cache.close().await;
    info!("User service stopped");
    served?;
    Ok(())
}

/// Run a migration command (for CLI commands).
pub async fn run_migrations(
    config: &UserServiceConfig,
    action: MigrateAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            for (name, applied) in db.migration_status().await? {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
