//! HTTP surface: routes, handlers, extractors and the OpenAPI document.

pub mod extractors;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
