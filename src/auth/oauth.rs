use axum::{
    extract::{FromRef, Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        cookies::{
            oauth_removal_cookie, oauth_transient_cookie, session_cookie, OAUTH_STATE_COOKIE,
            OAUTH_VERIFIER_COOKIE,
        },
        jwt::JwtKeys,
    },
    config::GoogleConfig,
    error::AuthError,
    state::AppState,
};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// OAuth client type with auth URL and token URL set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Google userinfo API response; only the fields we consume.
#[derive(Debug, Deserialize)]
struct GoogleUser {
    email: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: String,
    state: String,
}

pub fn oauth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/google", get(google_authorize))
        .route("/auth/google/callback", get(google_callback))
}

fn create_client(config: &GoogleConfig) -> Result<ConfiguredClient, AuthError> {
    let client = BasicClient::new(ClientId::new(config.client_id.clone()))
        .set_client_secret(ClientSecret::new(config.client_secret.clone()))
        .set_auth_uri(AuthUrl::new(GOOGLE_AUTH_URL.to_string()).map_err(anyhow::Error::from)?)
        .set_token_uri(TokenUrl::new(GOOGLE_TOKEN_URL.to_string()).map_err(anyhow::Error::from)?)
        .set_redirect_uri(
            RedirectUrl::new(config.redirect_url.clone()).map_err(anyhow::Error::from)?,
        );
    Ok(client)
}

/// Start the handshake: redirect to Google's consent screen, carrying the CSRF
/// state and PKCE verifier in short-lived cookies until the callback.
#[instrument(skip(state, jar))]
pub async fn google_authorize(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AuthError> {
    let google = state.config.google.as_ref().ok_or(AuthError::OauthUnavailable)?;
    let client = create_client(google)?;

    let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
    let (auth_url, csrf_state) = client
        .authorize_url(CsrfToken::new_random)
        .add_scope(Scope::new("openid".to_string()))
        .add_scope(Scope::new("email".to_string()))
        .add_scope(Scope::new("profile".to_string()))
        .set_pkce_challenge(pkce_challenge)
        .url();

    let jar = jar
        .add(oauth_transient_cookie(
            OAUTH_STATE_COOKIE,
            csrf_state.secret().clone(),
            &state.config,
        ))
        .add(oauth_transient_cookie(
            OAUTH_VERIFIER_COOKIE,
            pkce_verifier.secret().clone(),
            &state.config,
        ));

    Ok((jar, Redirect::to(auth_url.as_str())))
}

/// Finish the handshake. Any failure is logged and sent back to the login page;
/// the provider error is never surfaced to the end user.
#[instrument(skip(state, jar, params))]
pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> (CookieJar, Redirect) {
    let result = exchange_and_sign_in(&state, &jar, params).await;
    let jar = jar
        .remove(oauth_removal_cookie(OAUTH_STATE_COOKIE))
        .remove(oauth_removal_cookie(OAUTH_VERIFIER_COOKIE));

    match result {
        Ok(token) => {
            let jar = jar.add(session_cookie(token, &state.config));
            (jar, Redirect::to("/dashboard"))
        }
        Err(e) => {
            warn!(error = %e, "google callback rejected");
            (jar, Redirect::to("/login"))
        }
    }
}

async fn exchange_and_sign_in(
    state: &AppState,
    jar: &CookieJar,
    params: CallbackParams,
) -> anyhow::Result<String> {
    let google = state
        .config
        .google
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("google sign-in not configured"))?;

    let expected_state = jar
        .get(OAUTH_STATE_COOKIE)
        .map(|c| c.value().to_owned())
        .ok_or_else(|| anyhow::anyhow!("missing oauth state cookie"))?;
    if expected_state != params.state {
        anyhow::bail!("oauth state mismatch");
    }
    let verifier = jar
        .get(OAUTH_VERIFIER_COOKIE)
        .map(|c| c.value().to_owned())
        .ok_or_else(|| anyhow::anyhow!("missing pkce verifier cookie"))?;

    let client = create_client(google).map_err(|_| anyhow::anyhow!("oauth client setup failed"))?;
    let http_client = reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;

    let token_result = client
        .exchange_code(AuthorizationCode::new(params.code))
        .set_pkce_verifier(PkceCodeVerifier::new(verifier))
        .request_async(&http_client)
        .await?;

    let google_user: GoogleUser = reqwest::Client::new()
        .get(GOOGLE_USERINFO_URL)
        .bearer_auth(token_result.access_token().secret())
        .send()
        .await?
        .json()
        .await?;

    let email = crate::auth::dto::normalize_email(&google_user.email);
    let user = state.users.upsert_oauth(&email).await.map_err(|e| anyhow::anyhow!("{e}"))?;

    let keys = JwtKeys::from_ref(state);
    let token = keys.sign(user.id).map_err(|e| anyhow::anyhow!("{e}"))?;
    info!(user_id = %user.id, "google sign-in complete");
    Ok(token)
}
