//! Domain layer - Core business entities and value objects.
//!
//! This crate contains the user model shared by the repository and the
//! HTTP layer. It has no storage or transport dependencies.

pub mod constants;
pub mod user;

pub use constants::*;
pub use user::{generate_user_id, CreateUser, User, UserResponse};
