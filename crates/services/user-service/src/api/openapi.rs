//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::api::handlers::tech_handler::ComponentLiveness;
use crate::api::handlers::user_handler::CreateUserRequest;
use crate::config::UserServiceConfig;
use domain::UserResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::user_handler::create_user,
        crate::api::handlers::user_handler::get_user,
        crate::api::handlers::user_handler::delete_user,
        crate::api::handlers::tech_handler::list_cache_keys,
        crate::api::handlers::tech_handler::purge_cache,
        crate::api::handlers::tech_handler::healthcheck,
    ),
    components(
        schemas(
            CreateUserRequest,
            UserResponse,
            ComponentLiveness,
        )
    ),
    tags(
        (name = "Users", description = "User management endpoints"),
        (name = "Tech", description = "Cache maintenance and liveness"),
    )
)]
pub struct ApiDoc;

/// The document titled and versioned after the running service, with every
/// path under the configured route prefix.
pub fn api_doc(config: &UserServiceConfig) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = config.service.service_name.clone();
    doc.info.version = config.service.version.clone();

    let prefix = super::routes::route_prefix(&config.service.api_route);
    if !prefix.is_empty() {
        let paths = std::mem::take(&mut doc.paths.paths);
        doc.paths.paths = paths
            .into_iter()
            .map(|(path, item)| (format!("{}{}", prefix, path), item))
            .collect();
    }
    doc
}
