use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;

use super::handler::websocket_handler;
use crate::admin::admin_snapshot;
use crate::config::Config;
use crate::server::{bootstrap, CoordinatorServer};

/// Build the router: `/ws` for the game protocol, `/` and `/health` for
/// liveness, `/admin` for the password-protected snapshot.
pub fn create_router(cors_origins: &str) -> axum::Router<Arc<CoordinatorServer>> {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    let cors = if cors_origins == "*" {
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            tracing::warn!("No valid CORS origins configured, using permissive CORS");
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    axum::Router::new()
        .route("/ws", get(websocket_handler))
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/admin", get(admin_snapshot))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health_check(
    State(server): State<Arc<CoordinatorServer>>,
) -> axum::response::Result<&'static str> {
    if server.health_check().await {
        Ok("OK")
    } else {
        Err(axum::http::StatusCode::SERVICE_UNAVAILABLE.into())
    }
}

/// Build a [`CoordinatorServer`] from `config` and serve it on `addr`.
pub async fn run_server(addr: SocketAddr, config: Config) -> anyhow::Result<()> {
    let cors_origins = config.server.cors_origins.clone();
    let server = bootstrap(config);

    let app = create_router(&cors_origins).with_state(server);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "coordination server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
