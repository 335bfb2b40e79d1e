//! Database module for cositas
//!
//! This module provides database connectivity, models, repositories and the
//! store traits used by the authentication core.

#[cfg(test)]
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;
pub mod store;

pub use models::*;
pub use pool::{DbError, connect};
pub use repositories::{
    ProductRepository, ProductRepositoryError, SessionRepository, SessionRepositoryError,
    UserRepository, UserRepositoryError,
};
pub use store::{CredentialStore, SessionStore};

pub use sqlx::PgPool;
