//! Route guard for the admin area.
//!
//! The decision itself is a pure function of three booleans. The axum
//! middleware only gathers them for the current request and turns the
//! decision into a response:
//!
//! | protected | login path | session | decision            |
//! |-----------|------------|---------|---------------------|
//! | yes       | no         | no      | redirect to login   |
//! | yes       | no         | yes     | allow               |
//! | yes       | yes        | yes     | redirect to admin   |
//! | yes       | yes        | no      | allow (login form)  |
//! | no        | -          | -       | allow               |

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::core::auth::session::SessionManager;

/// Root of the admin area
pub const ADMIN_ROOT: &str = "/admin";

/// Login entry point inside the admin area
pub const LOGIN_PATH: &str = "/admin/login";

/// Outcome of the guard for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectToLogin,
    RedirectToAdmin,
}

/// Decide what to do with a request
pub fn decide(is_protected: bool, is_login: bool, has_session: bool) -> GuardDecision {
    match (is_protected, is_login, has_session) {
        (false, _, _) => GuardDecision::Allow,
        (true, false, false) => GuardDecision::RedirectToLogin,
        (true, false, true) => GuardDecision::Allow,
        (true, true, true) => GuardDecision::RedirectToAdmin,
        (true, true, false) => GuardDecision::Allow,
    }
}

/// Which paths the guard protects
#[derive(Debug, Clone)]
pub struct GuardPaths {
    pub admin_root: String,
    pub login_path: String,
}

impl Default for GuardPaths {
    fn default() -> Self {
        Self {
            admin_root: ADMIN_ROOT.to_string(),
            login_path: LOGIN_PATH.to_string(),
        }
    }
}

impl GuardPaths {
    /// `path` is the admin root or lies under it (segment-aware prefix)
    pub fn is_protected(&self, path: &str) -> bool {
        path.strip_prefix(self.admin_root.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    /// `path` is the login entry point, one trailing slash tolerated
    pub fn is_login(&self, path: &str) -> bool {
        let trimmed = path.strip_suffix('/').unwrap_or(path);
        trimmed == self.login_path
    }

    /// `(is_protected, is_login)` for a raw request path.
    ///
    /// Classification runs on [`normalize_path`], so encoded or doubled
    /// slashes cannot hide an admin path. Paths that fail to normalize count
    /// as protected.
    pub fn classify(&self, raw_path: &str) -> (bool, bool) {
        match normalize_path(raw_path) {
            Some(path) => (self.is_protected(&path), self.is_login(&path)),
            None => (true, false),
        }
    }
}

/// Canonical form of a request path as the static file service resolves it:
/// every segment percent-decoded, empty and `.` segments dropped.
///
/// Returns `None` when a segment is not valid UTF-8 once decoded or when the
/// path contains a `..` segment.
pub fn normalize_path(raw: &str) -> Option<String> {
    let mut segments = Vec::new();
    for segment in raw.split('/') {
        let decoded = urlencoding::decode(segment).ok()?;
        for part in decoded.split(['/', '\\']) {
            match part {
                "" | "." => {}
                ".." => return None,
                part => segments.push(part.to_string()),
            }
        }
    }
    Some(format!("/{}", segments.join("/")))
}

/// State for the guard middleware
#[derive(Clone)]
pub struct GuardState {
    pub sessions: SessionManager,
    pub paths: Arc<GuardPaths>,
}

impl GuardState {
    pub fn new(sessions: SessionManager) -> Self {
        Self {
            sessions,
            paths: Arc::new(GuardPaths::default()),
        }
    }
}

/// Middleware enforcing [`decide`] on every request.
///
/// Public paths never touch the session store. A store failure while
/// validating counts as "no session", and so does a path that cannot be
/// normalized.
pub async fn route_guard(
    State(state): State<GuardState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let paths = &state.paths;
    let (is_protected, is_login) = paths.classify(request.uri().path());

    if !is_protected {
        return next.run(request).await;
    }

    let has_session = match state.sessions.validate(&jar).await {
        Ok(session) => session.is_some(),
        Err(e) => {
            tracing::error!("Session lookup failed, treating request as anonymous: {}", e);
            false
        }
    };

    match decide(true, is_login, has_session) {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::RedirectToLogin => {
            tracing::debug!("Redirecting {} to login", request.uri().path());
            Redirect::to(&paths.login_path).into_response()
        }
        GuardDecision::RedirectToAdmin => {
            tracing::debug!("Already signed in, redirecting login to admin root");
            Redirect::to(&paths.admin_root).into_response()
        }
    }
}
