//! Repository layer for data access.

mod base;
pub mod entities;
mod filters;
mod user_repository;

pub use base::Repository;
pub use filters::{FilterValue, Filters};
pub use user_repository::{UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
