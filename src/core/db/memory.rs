//! In-memory stores used by the auth tests in place of PostgreSQL.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::db::models::{CreateSession, Session, User};
use crate::core::db::repositories::{SessionRepositoryError, UserRepositoryError};
use crate::core::db::store::{CredentialStore, SessionStore};

#[derive(Default)]
pub struct MemoryCredentialStore {
    users: RwLock<Vec<User>>,
    fail: AtomicBool,
}

impl MemoryCredentialStore {
    /// Make every subsequent call fail as if the database were unreachable.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), UserRepositoryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(UserRepositoryError::DatabaseError(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        self.check()?;
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, UserRepositoryError> {
        self.check()?;
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn upsert(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, UserRepositoryError> {
        self.check()?;
        let mut users = self.users.write().await;
        let now = Utc::now();

        if let Some(user) = users.iter_mut().find(|u| u.username == username) {
            user.password_hash = password_hash.to_string();
            user.updated_at = now;
            return Ok(user.clone());
        }

        let user = User {
            id: users.len() as i32 + 1,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_password_hash(
        &self,
        id: i32,
        password_hash: &str,
    ) -> Result<(), UserRepositoryError> {
        self.check()?;
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(UserRepositoryError::NotFound)?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    fail: AtomicBool,
}

impl MemorySessionStore {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Move the expiry of every stored session, used to simulate elapsed time.
    pub async fn expire_all(&self, at: DateTime<Utc>) {
        for session in self.sessions.write().await.values_mut() {
            session.expires_at = at;
        }
    }

    fn check(&self) -> Result<(), SessionRepositoryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SessionRepositoryError::DatabaseError(
                sqlx::Error::PoolTimedOut,
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, dto: &CreateSession) -> Result<Session, SessionRepositoryError> {
        self.check()?;
        let session = Session {
            id: Uuid::new_v4(),
            user_id: dto.user_id,
            token_hash: dto.token_hash.clone(),
            expires_at: dto.expires_at,
            created_at: Utc::now(),
        };
        self.sessions
            .write()
            .await
            .insert(session.token_hash.clone(), session.clone());
        Ok(session)
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Session>, SessionRepositoryError> {
        self.check()?;
        Ok(self.sessions.read().await.get(token_hash).cloned())
    }

    async fn delete_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<bool, SessionRepositoryError> {
        self.check()?;
        Ok(self.sessions.write().await.remove(token_hash).is_some())
    }

    async fn delete_all_for_user(&self, user_id: i32) -> Result<u64, SessionRepositoryError> {
        self.check()?;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, SessionRepositoryError> {
        self.check()?;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - sessions.len()) as u64)
    }
}
