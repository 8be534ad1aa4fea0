//! Technical endpoints: cache inspection and liveness.

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;
use utoipa::ToSchema;

use common::AppResult;

use crate::api::state::AppState;
use crate::cache::CacheHandler;

/// Key written by the healthcheck
pub const HEALTHCHECK_KEY: &str = "test";
pub const HEALTHCHECK_TTL_SECONDS: u64 = 30;

/// Liveness of one backing component.
#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentLiveness {
    #[schema(example = "redis")]
    pub component: String,
    pub liveness: bool,
}

pub fn tech_routes() -> Router<AppState> {
    Router::new()
        .route("/users/redis/keys", get(list_cache_keys).delete(purge_cache))
        .route("/healthcheck", get(healthcheck))
}

/// List every cache key
#[utoipa::path(
    get,
    path = "/v1/tech/users/redis/keys",
    tag = "Tech",
    responses(
        (status = 200, description = "Cache keys", body = Vec<String>)
    )
)]
pub async fn list_cache_keys(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.cache.list_all_keys().await?))
}

/// Delete every cache key
#[utoipa::path(
    delete,
    path = "/v1/tech/users/redis/keys",
    tag = "Tech",
    responses(
        (status = 204, description = "Cache purged")
    )
)]
pub async fn purge_cache(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.cache.delete_all_keys().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Report cache liveness
#[utoipa::path(
    get,
    path = "/v1/tech/healthcheck",
    tag = "Tech",
    responses(
        (status = 200, description = "Component liveness", body = Vec<ComponentLiveness>)
    )
)]
pub async fn healthcheck(State(state): State<AppState>) -> Json<Vec<ComponentLiveness>> {
    let handler = CacheHandler::new(
        state.cache.clone(),
        HEALTHCHECK_KEY,
        Some(HEALTHCHECK_TTL_SECONDS),
    );
    Json(vec![ComponentLiveness {
        component: "redis".to_string(),
        liveness: handler.is_alive().await,
    }])
}
