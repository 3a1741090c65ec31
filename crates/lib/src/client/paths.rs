//! Request path classification for the request pipeline.

use reqwest::Method;

/// Current-user probe, the session bootstrap call.
pub const AUTH_ME: &str = "/api/auth/me";

/// Credential exchange establishing the session cookie.
pub const AUTH_LOGIN: &str = "/api/auth/login";

/// Session teardown.
pub const AUTH_LOGOUT: &str = "/api/auth/logout";

/// CSRF token issuance.
pub const AUTH_CSRF_TOKEN: &str = "/api/auth/csrf-token";

/// Paths that establish, probe, or tear down a session. Unauthorized
/// responses on these are part of normal auth flow and never count toward
/// the session-loss heuristic; they are also sent without a CSRF header.
const BOOTSTRAP_PATHS: [&str; 4] = [AUTH_ME, AUTH_LOGIN, AUTH_LOGOUT, AUTH_CSRF_TOKEN];

/// Whether `path` belongs to the auth bootstrap surface. Query strings
/// are ignored.
pub fn is_bootstrap_path(path: &str) -> bool {
    let path = path.split('?').next().unwrap_or(path);
    BOOTSTRAP_PATHS.contains(&path)
}

/// Whether `method` changes server state and therefore needs the CSRF
/// header.
pub(crate) fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::DELETE | Method::PATCH
    )
}
