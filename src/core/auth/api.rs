//! Auth API endpoints
//!
//! Provides REST API endpoints for authentication:
//! - POST /api/auth/login - Verify credentials and set the session cookie
//! - POST /api/auth/logout - Revoke the session and clear the cookie
//! - GET /api/auth/session - Report whether the request is authenticated
//! - POST /api/auth/password - Change the admin password
//! - GET /api/setup - Seed the admin account (only when configured)

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::auth::{AuthError, AuthService, LoginRequest};

/// Credentials used by the setup endpoint
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

/// Auth API state containing the auth service
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: AuthService,
    pub admin_seed: Option<AdminSeed>,
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Convert AuthError to API response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AuthError::PasswordTooShort => (StatusCode::BAD_REQUEST, "PASSWORD_TOO_SHORT"),
            AuthError::InvalidUsername => (StatusCode::BAD_REQUEST, "INVALID_USERNAME"),
            AuthError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        // Store errors are logged here and hidden from the client
        let message = match &self {
            AuthError::InternalError(detail) => {
                tracing::error!("Auth request failed: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiError::new(message, code))).into_response()
    }
}

/// Generic success response
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

impl SuccessResponse {
    fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}

/// Response for session status
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Request for changing password
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Create the auth API router
pub fn auth_api_router(state: AuthApiState) -> Router {
    let with_setup = state.admin_seed.is_some();
    let state = Arc::new(state);

    let router = Router::new()
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/auth/session", get(session_handler))
        .route("/api/auth/password", post(change_password_handler));

    let router = if with_setup {
        router.route("/api/setup", get(setup_handler))
    } else {
        router
    };

    router.with_state(state)
}

/// POST /api/auth/login
/// Verify credentials and set the session cookie
async fn login_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SuccessResponse>), AuthError> {
    tracing::info!("Login attempt for user: {}", request.username);

    let outcome = match state.auth_service.login(&request).await {
        Ok(outcome) => outcome,
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("Rejected login for user: {}", request.username);
            return Err(AuthError::InvalidCredentials);
        }
        Err(e) => return Err(e),
    };

    tracing::info!("User logged in: {}", outcome.user.username);

    let cookie = state
        .auth_service
        .sessions()
        .session_cookie(outcome.session.token);

    Ok((jar.add(cookie), SuccessResponse::ok("Login successful")))
}

/// POST /api/auth/logout
/// Revoke the current session and clear the cookie
async fn logout_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
) -> (CookieJar, Json<SuccessResponse>) {
    state.auth_service.logout(&jar).await;

    let removal = state.auth_service.sessions().removal_cookie();
    (jar.remove(removal), SuccessResponse::ok("Logged out"))
}

/// GET /api/auth/session
/// Report whether the request carries a live session
async fn session_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
) -> Result<Json<SessionStatusResponse>, AuthError> {
    let user = state.auth_service.current_user(&jar).await?;

    Ok(Json(SessionStatusResponse {
        authenticated: user.is_some(),
        username: user.map(|u| u.username),
    }))
}

/// POST /api/auth/password
/// Change the password of the signed-in user; every session is revoked
async fn change_password_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<(CookieJar, Json<SuccessResponse>), AuthError> {
    let session = state.auth_service.require_session(&jar).await?;

    state
        .auth_service
        .change_password(
            session.user_id,
            &request.current_password,
            &request.new_password,
        )
        .await?;

    let removal = state.auth_service.sessions().removal_cookie();
    Ok((
        jar.remove(removal),
        SuccessResponse::ok("Password changed, please log in again"),
    ))
}

/// GET /api/setup
/// Create or reset the admin account from the configured seed
async fn setup_handler(
    State(state): State<Arc<AuthApiState>>,
) -> Result<Json<SuccessResponse>, AuthError> {
    let Some(seed) = &state.admin_seed else {
        return Err(AuthError::Unauthorized);
    };

    let user = state
        .auth_service
        .seed_admin(&seed.username, &seed.password)
        .await?;

    tracing::info!("Admin account seeded: {}", user.username);

    Ok(SuccessResponse::ok(format!(
        "Admin user '{}' is ready",
        user.username
    )))
}
