//! API Routes
//!
//! Configures the Axum router with all disk optimizer endpoints.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, optimize_handler, read_handler, stats_handler, write_handler, AppState,
};

/// Largest accepted upload body
pub const MAX_BODY_SIZE: usize = 256 * 1024 * 1024;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /files/*path` - Read a file (cache first)
/// - `PUT /files/*path` - Write a file and refresh the cache
/// - `GET /stats` - Optimizer statistics
/// - `POST /optimize` - Run a maintenance pass
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/files/*path", get(read_handler).put(write_handler))
        .route("/stats", get(stats_handler))
        .route("/optimize", post(optimize_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
