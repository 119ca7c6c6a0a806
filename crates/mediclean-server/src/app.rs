//! Router assembly and server loop

use crate::routes;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Build the Axum application
pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let max_upload_bytes = state.config.max_upload_bytes;

    let api_routes = Router::new().route("/upload", post(routes::upload));

    Router::new()
        .nest("/api", api_routes)
        .route("/download/all", get(routes::download_all))
        .route("/download/:filename", get(routes::download))
        .route("/health", get(routes::health))
        .route("/metrics", get(routes::metrics))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Allow the configured origins, or any origin when none are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = if allowed.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(allowed))
    };

    cors.allow_methods(Any).allow_headers(Any)
}

/// Run the server until `shutdown` resolves
pub async fn run_server(
    state: AppState,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("MediClean listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
