use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::config::AppConfig;

/// Name of the session cookie carrying the signed token.
pub const SESSION_COOKIE: &str = "token";

/// Transient cookies for the OAuth handshake.
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";
pub const OAUTH_VERIFIER_COOKIE: &str = "oauth_verifier";

const OAUTH_COOKIE_TTL: Duration = Duration::minutes(10);

/// HTTP-only session cookie, lifetime matched to the token TTL.
pub fn session_cookie(token: String, config: &AppConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::days(config.jwt.ttl_days))
        .build()
}

/// Expired session cookie, used to clear the client on logout.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Short-lived carrier for the CSRF state and PKCE verifier between the
/// authorize redirect and the provider callback.
pub fn oauth_transient_cookie(
    name: &'static str,
    value: String,
    config: &AppConfig,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(OAUTH_COOKIE_TTL)
        .build()
}

pub fn oauth_removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    #[test]
    fn session_cookie_attributes() {
        let state = AppState::fake();
        let cookie = session_cookie("tok".into(), &state.config);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::days(7)));
    }
}
