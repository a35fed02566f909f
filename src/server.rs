use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::handlers::{self, AppState};
use crate::signals::shutdown_signal;

/// Request bodies are tiny JSON objects
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Start the bid calculation server
///
/// 1. Opens the fee database and applies migrations
/// 2. Builds the router
/// 3. Serves requests until SIGTERM/SIGINT, then drains connections
pub async fn start_server(config: Config) -> Result<()> {
    let pool = db::connect(&config.database).await?;
    let app = create_router(AppState::from_pool(pool.clone()));

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    info!("Starting bid calculator on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    pool.close().await;
    info!("Server stopped gracefully");

    Ok(())
}

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/vehicles", get(handlers::vehicles::list_vehicles))
        .route("/api/vehicles/:id", get(handlers::vehicles::get_vehicle))
        .route("/api/calculate", post(handlers::calculate::calculate))
        .route("/api/fees/:type", get(handlers::fees::get_fee_schedule));

    Router::new()
        .route("/", get(handlers::health::index))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .merge(api_routes)
        .fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(handlers::cors::cors_middleware))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use sqlx::SqlitePool;
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        create_router(AppState::from_pool(pool))
    }

    #[tokio::test]
    async fn test_unknown_route_returns_json_404() {
        let app = test_router().await;
        let response = app
            .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_root_banner() {
        let app = test_router().await;
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"Bid Calculation Backend - running");
    }
}
