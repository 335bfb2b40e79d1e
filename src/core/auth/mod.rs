//! Authentication module for cositas
//!
//! This module provides authentication functionality including:
//! - SHA-256 credential verification
//! - Server-side sessions carried by the `auth_token` cookie
//! - The route guard protecting the admin area
//! - REST API endpoints for auth operations

pub mod api;
pub mod credentials;
pub mod guard;
pub mod service;
pub mod session;

pub use api::{AdminSeed, ApiError, AuthApiState, auth_api_router};
pub use credentials::{CredentialVerifier, hash_password};
pub use guard::{GuardDecision, GuardPaths, GuardState, route_guard};
pub use service::{AuthError, AuthService, LoginOutcome, LoginRequest};
pub use session::{IssuedSession, SESSION_COOKIE_NAME, SessionConfig, SessionManager};
