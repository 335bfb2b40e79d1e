//! Session issuing and validation.
//!
//! A login creates a random 256-bit token. The client keeps it in the
//! `auth_token` cookie, the server keeps only its SHA-256 together with an
//! expiry. A request is authenticated iff its cookie maps to a live record.

use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::core::db::models::{CreateSession, Session};
use crate::core::db::repositories::{SessionRepository, SessionRepositoryError};
use crate::core::db::store::SessionStore;

/// Name of the session cookie
pub const SESSION_COOKIE_NAME: &str = "auth_token";

/// Default session lifetime (one day)
pub const DEFAULT_SESSION_MAX_AGE_SECS: i64 = 60 * 60 * 24;

/// Longest accepted session lifetime (one year)
pub const MAX_SESSION_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 365;

/// Random bytes per session token
const TOKEN_BYTES: usize = 32;

/// Cookie and lifetime settings for sessions
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Lifetime of a session, both cookie Max-Age and server-side expiry
    pub max_age_secs: i64,
    /// Emit the `Secure` attribute (production only)
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_age_secs: DEFAULT_SESSION_MAX_AGE_SECS,
            secure: false,
        }
    }
}

impl SessionConfig {
    pub fn new(max_age_secs: i64, secure: bool) -> Self {
        Self {
            max_age_secs,
            secure,
        }
    }

    /// Lifetime actually applied, kept within `1..=MAX_SESSION_MAX_AGE_SECS`
    pub fn lifetime_secs(&self) -> i64 {
        self.max_age_secs.clamp(1, MAX_SESSION_MAX_AGE_SECS)
    }
}

/// A freshly issued session and the raw token to hand to the client
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub session: Session,
}

/// Issues, validates and revokes sessions
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Generate a new random token (64 hex characters)
    pub fn generate_token() -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Create a session record for `user_id`
    pub async fn issue(&self, user_id: i32) -> Result<IssuedSession, SessionRepositoryError> {
        let token = Self::generate_token();
        let session = self
            .store
            .create(&CreateSession {
                user_id,
                token_hash: SessionRepository::hash_token(&token),
                expires_at: Utc::now() + Duration::seconds(self.config.lifetime_secs()),
            })
            .await?;

        Ok(IssuedSession { token, session })
    }

    /// Build the `Set-Cookie` cookie carrying `token`
    pub fn session_cookie(&self, token: impl Into<String>) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, token.into()))
            .http_only(true)
            .path("/")
            .secure(self.config.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.config.lifetime_secs()))
            .build()
    }

    /// Cookie used to clear the session cookie; path must match the issued one
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, ""))
            .http_only(true)
            .path("/")
            .secure(self.config.secure)
            .same_site(SameSite::Lax)
            .build()
    }

    /// Validate the session cookie of a request.
    ///
    /// A missing or empty cookie, an unknown token and an expired record all
    /// yield `Ok(None)`. Expired records are removed on the way.
    pub async fn validate(
        &self,
        jar: &CookieJar,
    ) -> Result<Option<Session>, SessionRepositoryError> {
        match session_token(jar) {
            Some(token) => self.validate_token(token).await,
            None => Ok(None),
        }
    }

    /// Validate a raw token
    pub async fn validate_token(
        &self,
        token: &str,
    ) -> Result<Option<Session>, SessionRepositoryError> {
        let token_hash = SessionRepository::hash_token(token);
        let Some(session) = self.store.find_by_token_hash(&token_hash).await? else {
            return Ok(None);
        };

        if session.is_expired_at(Utc::now()) {
            tracing::debug!("Session {} expired, removing it", session.id);
            self.store.delete_by_token_hash(&token_hash).await?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Delete the session referenced by the request cookie, if any.
    /// Returns whether a record was removed.
    pub async fn revoke(&self, jar: &CookieJar) -> Result<bool, SessionRepositoryError> {
        match session_token(jar) {
            Some(token) => {
                self.store
                    .delete_by_token_hash(&SessionRepository::hash_token(token))
                    .await
            }
            None => Ok(false),
        }
    }

    /// Delete every session of a user
    pub async fn revoke_all(&self, user_id: i32) -> Result<u64, SessionRepositoryError> {
        self.store.delete_all_for_user(user_id).await
    }

    /// Delete all sessions past their expiry
    pub async fn cleanup_expired(&self) -> Result<u64, SessionRepositoryError> {
        self.store.delete_expired(Utc::now()).await
    }
}

/// Non-empty value of the session cookie
fn session_token(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE_NAME)
        .map(|c| c.value())
        .filter(|v| !v.is_empty())
}
