//! Dashboard — read-only Axum JSON API over a running game.
//!
//! CORS allows GET from anywhere for local tooling.

pub mod routes;

use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

pub use routes::{AppState, BoardState};

/// Start the dashboard web server as a background task.
pub fn spawn_dashboard(state: AppState, port: u16) {
    let app = build_router(state);

    tokio::spawn(async move {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        info!(port, "Dashboard server starting on http://localhost:{port}");

        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(l) => l,
            Err(e) => {
                error!(port, error = %e, "Failed to bind dashboard port");
                return;
            }
        };

        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Dashboard server error");
        }
    });
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/status", get(routes::get_status))
        .route("/api/standings", get(routes::get_standings))
        .route("/api/rounds", get(routes::get_rounds))
        .route("/api/rounds/latest", get(routes::get_latest_round))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
