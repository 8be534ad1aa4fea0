//! Route configuration.

use axum::Router;
use tower_http::cors::CorsLayer;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers::{tech_routes, user_routes};
use crate::api::openapi::api_doc;
use crate::api::state::AppState;

/// Normalize `API_ROUTE` to either `""` or `/segment[/segment...]`.
pub fn route_prefix(api_route: &str) -> String {
    let trimmed = api_route.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let prefix = route_prefix(&state.config.service.api_route);
    let doc = api_doc(&state.config);

    Router::new()
        .nest(&format!("{}/v1", prefix), user_routes())
        .nest(&format!("{}/v1/tech", prefix), tech_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
