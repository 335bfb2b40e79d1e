//! Password digests and credential verification.
//!
//! Passwords are stored as the unsalted SHA-256 hex digest of the plaintext.
//! Existing admin accounts were seeded with this scheme, so it is kept for
//! compatibility.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::core::db::models::User;
use crate::core::db::repositories::UserRepositoryError;
use crate::core::db::store::CredentialStore;

/// SHA-256 hex digest of a password (64 lowercase hex characters)
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare two digests without short-circuiting on the first mismatch
pub fn digests_match(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Checks submitted credentials against the credential store
#[derive(Clone)]
pub struct CredentialVerifier {
    store: Arc<dyn CredentialStore>,
}

impl CredentialVerifier {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Returns the user when the password digest matches the stored one.
    ///
    /// An unknown username and a wrong password both yield `Ok(None)`, and
    /// both hash and compare before answering.
    pub async fn verify(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        let submitted = hash_password(password);
        let user = self.store.find_by_username(username).await?;
        Ok(matching(user, &submitted))
    }

    /// Verify a password for a user already identified by ID
    pub async fn verify_user_id(
        &self,
        user_id: i32,
        password: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        let submitted = hash_password(password);
        let user = self.store.find_by_id(user_id).await?;
        Ok(matching(user, &submitted))
    }
}

/// Compared against when the user does not exist
const UNKNOWN_USER_DIGEST: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

fn matching(user: Option<User>, submitted: &str) -> Option<User> {
    let stored = user
        .as_ref()
        .map_or(UNKNOWN_USER_DIGEST, |u| u.password_hash.as_str());
    let matches = digests_match(submitted, stored);
    user.filter(|_| matches)
}
