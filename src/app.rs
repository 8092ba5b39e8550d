use std::net::SocketAddr;

use axum::{middleware, response::Html, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::guard;
use crate::state::AppState;
use crate::auth;

// Placeholder pages; real markup is out of scope, the guard just needs
// something to protect.
async fn login_page() -> Html<&'static str> {
    Html("<h1>Login</h1>")
}

async fn dashboard_page() -> Html<&'static str> {
    Html("<h1>Dashboard</h1>")
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest("/api", auth::router())
        .route("/login", get(login_page))
        .route("/dashboard", get(dashboard_page))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_session,
        ))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
