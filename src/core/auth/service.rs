//! Authentication service
//!
//! Provides the business logic for login, logout, password changes and admin
//! seeding. Coordinates the credential verifier and the session manager.

use std::sync::Arc;

use axum_extra::extract::cookie::CookieJar;

use crate::core::auth::credentials::{CredentialVerifier, hash_password};
use crate::core::auth::session::{IssuedSession, SessionConfig, SessionManager};
use crate::core::db::models::{Session, User, UserResponse};
use crate::core::db::repositories::{SessionRepositoryError, UserRepositoryError};
use crate::core::db::store::{CredentialStore, SessionStore};

/// Minimum length accepted for a new password
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Password too short (minimum 8 characters)")]
    PasswordTooShort,

    #[error("Username cannot be empty")]
    InvalidUsername,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<UserRepositoryError> for AuthError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::NotFound => AuthError::Unauthorized,
            UserRepositoryError::DatabaseError(_) => AuthError::InternalError(err.to_string()),
        }
    }
}

impl From<SessionRepositoryError> for AuthError {
    fn from(err: SessionRepositoryError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

/// Login request data
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login: the user and the session to hand out as a cookie
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: UserResponse,
    pub session: IssuedSession,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    verifier: CredentialVerifier,
    sessions: SessionManager,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        users: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            verifier: CredentialVerifier::new(users.clone()),
            users,
            sessions: SessionManager::new(sessions, session_config),
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Verify credentials and open a session
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome, AuthError> {
        let user = self
            .verifier
            .verify(&request.username, &request.password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let session = self.sessions.issue(user.id).await?;

        Ok(LoginOutcome {
            user: user.into(),
            session,
        })
    }

    /// Close the session referenced by the request cookie, if any.
    ///
    /// A store failure is logged and swallowed: the caller still clears the
    /// cookie, and the orphaned record expires on its own.
    pub async fn logout(&self, jar: &CookieJar) {
        match self.sessions.revoke(jar).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!("Logout without a live session"),
            Err(e) => tracing::error!("Failed to revoke session on logout: {}", e),
        }
    }

    /// Resolve the current session, or `Unauthorized`
    pub async fn require_session(&self, jar: &CookieJar) -> Result<Session, AuthError> {
        self.sessions
            .validate(jar)
            .await?
            .ok_or(AuthError::Unauthorized)
    }

    /// User owning the current session, if the request is authenticated
    pub async fn current_user(&self, jar: &CookieJar) -> Result<Option<User>, AuthError> {
        let Some(session) = self.sessions.validate(jar).await? else {
            return Ok(None);
        };

        Ok(self.users.find_by_id(session.user_id).await?)
    }

    /// Change the password of the signed-in user and revoke all of their
    /// sessions, including the current one
    pub async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.verifier
            .verify_user_id(user_id, current_password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Self::validate_password(new_password)?;

        self.users
            .update_password_hash(user_id, &hash_password(new_password))
            .await?;
        let revoked = self.sessions.revoke_all(user_id).await?;

        tracing::info!("Password changed for user {}, {} sessions revoked", user_id, revoked);
        Ok(())
    }

    /// Create the admin account, or reset its password if it already exists
    pub async fn seed_admin(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::InvalidUsername);
        }

        let user = self.users.upsert(username, &hash_password(password)).await?;
        Ok(user)
    }

    fn validate_password(password: &str) -> Result<(), AuthError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::PasswordTooShort);
        }
        Ok(())
    }
}
