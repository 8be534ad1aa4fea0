//! HTTP handlers.

pub mod tech_handler;
pub mod user_handler;

pub use tech_handler::tech_routes;
pub use user_handler::user_routes;
