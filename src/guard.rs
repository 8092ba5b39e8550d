use axum::{
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::auth::cookies::SESSION_COOKIE;
use crate::auth::jwt::JwtKeys;
use crate::state::AppState;

/// Path prefixes that require a valid session.
const PROTECTED_PREFIXES: &[&str] = &["/dashboard"];

fn is_protected(path: &str) -> bool {
    PROTECTED_PREFIXES.iter().any(|p| path.starts_with(p))
}

/// Runs before every handler. Unprotected paths pass through; protected paths
/// need a session cookie that verifies, otherwise the client is sent to the
/// login page. Token failures are never surfaced as errors here.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    if !is_protected(req.uri().path()) {
        return next.run(req).await;
    }

    let Some(token) = jar.get(SESSION_COOKIE) else {
        debug!(path = %req.uri().path(), "no session cookie, redirecting");
        return Redirect::to("/login").into_response();
    };

    let keys = JwtKeys::from_ref(&state);
    match keys.verify(token.value()) {
        Ok(_) => next.run(req).await,
        Err(_) => {
            debug!(path = %req.uri().path(), "session rejected, redirecting");
            Redirect::to("/login").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_match_covers_nested_paths() {
        assert!(is_protected("/dashboard"));
        assert!(is_protected("/dashboard/settings"));
        assert!(!is_protected("/login"));
        assert!(!is_protected("/api/auth/login"));
    }
}
