//! Session repository for admin login sessions
//!
//! Handles storage and validation of session tokens issued at login.
//! Tokens are stored as SHA-256 hashes so a leaked table cannot be replayed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::{CreateSession, Session};
use crate::core::db::store::SessionStore;

/// Session repository error types
#[derive(Debug, thiserror::Error)]
pub enum SessionRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Session repository for database operations
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Hash a token using SHA-256
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        let result = hasher.finalize();
        hex::encode(result)
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn create(&self, dto: &CreateSession) -> Result<Session, SessionRepositoryError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, user_id, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, token_hash, expires_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(dto.user_id)
        .bind(&dto.token_hash)
        .bind(dto.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Session>, SessionRepositoryError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, token_hash, expires_at, created_at
            FROM sessions
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn delete_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<bool, SessionRepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_for_user(&self, user_id: i32) -> Result<u64, SessionRepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, SessionRepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    // ========================================================================
    // Token Hashing Tests (don't require database)
    // ========================================================================

    #[test]
    fn test_hash_token_produces_consistent_hash() {
        let token = "9f2c1b7e_session_token";
        assert_eq!(
            SessionRepository::hash_token(token),
            SessionRepository::hash_token(token)
        );
    }

    #[test]
    fn test_hash_token_produces_different_hashes_for_different_tokens() {
        let hash1 = SessionRepository::hash_token("token_one");
        let hash2 = SessionRepository::hash_token("token_two");

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_hash_token_produces_64_char_hex_string() {
        let hash = SessionRepository::hash_token("any_token");

        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    // ========================================================================
    // Integration Tests (require database)
    // ========================================================================

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_create_and_find_session() {
        let (pool, user_id) = setup_test_user().await;
        let repo = SessionRepository::new(pool.clone());

        let token_hash = SessionRepository::hash_token("findable_token");
        let created = repo
            .create(&CreateSession {
                user_id,
                token_hash: token_hash.clone(),
                expires_at: Utc::now() + Duration::days(1),
            })
            .await
            .unwrap();

        let found = repo.find_by_token_hash(&token_hash).await.unwrap();
        assert_eq!(found.unwrap().id, created.id);

        assert_eq!(found_session_user(&repo, &token_hash).await, Some(user_id));

        cleanup_test_user(&pool, user_id).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_delete_by_token_hash_is_idempotent() {
        let (pool, user_id) = setup_test_user().await;
        let repo = SessionRepository::new(pool.clone());

        let token_hash = SessionRepository::hash_token("deletable_token");
        repo.create(&CreateSession {
            user_id,
            token_hash: token_hash.clone(),
            expires_at: Utc::now() + Duration::days(1),
        })
        .await
        .unwrap();

        assert!(repo.delete_by_token_hash(&token_hash).await.unwrap());
        assert!(!repo.delete_by_token_hash(&token_hash).await.unwrap());

        cleanup_test_user(&pool, user_id).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_delete_all_for_user_and_expired() {
        let (pool, user_id) = setup_test_user().await;
        let repo = SessionRepository::new(pool.clone());

        for (token, days) in [("live1", 1), ("live2", 1), ("stale", -1)] {
            repo.create(&CreateSession {
                user_id,
                token_hash: SessionRepository::hash_token(token),
                expires_at: Utc::now() + Duration::days(days),
            })
            .await
            .unwrap();
        }

        assert_eq!(repo.delete_expired(Utc::now()).await.unwrap(), 1);
        assert!(
            repo.find_by_token_hash(&SessionRepository::hash_token("stale"))
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(repo.delete_all_for_user(user_id).await.unwrap(), 2);
        assert_eq!(repo.delete_all_for_user(user_id).await.unwrap(), 0);

        cleanup_test_user(&pool, user_id).await;
    }

    // Helper functions for integration tests
    async fn found_session_user(repo: &SessionRepository, token_hash: &str) -> Option<i32> {
        repo.find_by_token_hash(token_hash)
            .await
            .unwrap()
            .map(|s| s.user_id)
    }

    async fn create_test_pool() -> PgPool {
        crate::core::db::pool::connect(&crate::core::config::Config::from_env())
            .await
            .expect("Failed to create test pool")
    }

    async fn setup_test_user() -> (PgPool, i32) {
        let pool = create_test_pool().await;
        let username = format!("session_test_{}", &Uuid::new_v4().to_string()[..8]);

        let (user_id,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, 'test_hash')
            RETURNING id
            "#,
        )
        .bind(&username)
        .fetch_one(&pool)
        .await
        .expect("Failed to create test user");

        (pool, user_id)
    }

    async fn cleanup_test_user(pool: &PgPool, user_id: i32) {
        // Sessions will be deleted by CASCADE
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(pool)
            .await
            .expect("Failed to cleanup test user");
    }
}
