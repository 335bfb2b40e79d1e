//! Storage traits for the authentication core.
//!
//! The auth service only talks to these traits, so the login/session flow can
//! run against PostgreSQL in production and against in-memory stores in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::db::models::{CreateSession, Session, User};
use crate::core::db::repositories::{SessionRepositoryError, UserRepositoryError};

/// Persisted mapping from username to password hash
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a user by exact username.
    async fn find_by_username(&self, username: &str)
    -> Result<Option<User>, UserRepositoryError>;

    /// Look up a user by ID.
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, UserRepositoryError>;

    /// Create the user if missing, otherwise overwrite its password hash.
    async fn upsert(&self, username: &str, password_hash: &str)
    -> Result<User, UserRepositoryError>;

    /// Replace the password hash of an existing user.
    async fn update_password_hash(
        &self,
        id: i32,
        password_hash: &str,
    ) -> Result<(), UserRepositoryError>;
}

/// Server-side session records keyed by token hash
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, dto: &CreateSession) -> Result<Session, SessionRepositoryError>;

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Session>, SessionRepositoryError>;

    /// Returns whether a record was removed.
    async fn delete_by_token_hash(&self, token_hash: &str)
    -> Result<bool, SessionRepositoryError>;

    async fn delete_all_for_user(&self, user_id: i32) -> Result<u64, SessionRepositoryError>;

    /// Remove every session that expired before `now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, SessionRepositoryError>;
}
