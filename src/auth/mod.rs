use crate::state::AppState;
use axum::Router;

pub mod cookies;
mod dto;
pub mod handlers;
pub(crate) mod extractors;
pub mod jwt;
pub mod oauth;
pub mod password;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(oauth::oauth_routes())
}
