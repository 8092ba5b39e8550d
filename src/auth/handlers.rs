use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        cookies::{removal_cookie, session_cookie},
        dto::{normalize_email, validate_login, validate_register, LoginRequest, PublicUser, RegisterRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        repo::{create_user, verify_user},
    },
    error::AuthError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AuthError> {
    payload.email = normalize_email(&payload.email);
    validate_register(&payload.email, &payload.password)?;

    let user = create_user(state.users.as_ref(), &payload.email, &payload.password)
        .await
        .map_err(|e| {
            if matches!(e, AuthError::AlreadyExists) {
                warn!(email = %payload.email, "email already registered");
            }
            e
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<PublicUser>), AuthError> {
    payload.email = normalize_email(&payload.email);
    validate_login(&payload.email, &payload.password)?;

    let user = verify_user(state.users.as_ref(), &payload.email, &payload.password)
        .await
        .map_err(|e| {
            if matches!(e, AuthError::InvalidCredentials) {
                warn!(email = %payload.email, "login rejected");
            }
            e
        })?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;
    let jar = jar.add(session_cookie(token, &state.config));

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((jar, Json(user.into())))
}

#[instrument(skip(jar))]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    let jar = jar.remove(removal_cookie());
    (jar, Json(serde_json::json!({ "ok": true })))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AuthError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::InvalidToken)?;
    Ok(Json(user.into()))
}
