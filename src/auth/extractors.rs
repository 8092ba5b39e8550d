use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;
use uuid::Uuid;

use crate::auth::cookies::SESSION_COOKIE;
use crate::auth::jwt::JwtKeys;
use crate::error::AuthError;

/// Extracts the session cookie and validates it, yielding the user id.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_owned())
            .ok_or(AuthError::InvalidToken)?;

        let claims = keys.verify(&token).map_err(|e| {
            warn!("invalid or expired session token");
            e
        })?;

        Ok(AuthUser(claims.sub))
    }
}
