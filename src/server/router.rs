use axum::http::{header, HeaderName, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{access, health, invoke};
use crate::state::AppState;

/// Creates the application router with all routes and middleware.
///
/// - CORS for browser clients
/// - `/invoke` search endpoint (explicit OPTIONS responder plus POST)
/// - `/access` admin endpoints
/// - `/health` check
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/invoke",
            post(invoke::invoke).options(invoke::preflight),
        )
        .route(
            "/access",
            get(access::list_access).post(access::modify_access),
        )
        .with_state(state)
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-access-token"),
            HeaderName::from_static("x-admin-key"),
        ])
}
