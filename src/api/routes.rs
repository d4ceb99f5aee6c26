//! API Routes
//!
//! Configures the Axum router with all endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    advance_handler, books_handler, delete_handler, health_handler, lookup_handler,
    stats_handler, version_handler, versions_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /books` - Cached demo query
/// - `POST /feed/advance` - Change feed input
/// - `GET /versions` - All known constraint versions
/// - `GET /versions/:constraint` - One constraint version
/// - `GET /cache/:key` - Raw cache lookup
/// - `DELETE /cache/:key` - Remove a cached record
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/books", get(books_handler))
        .route("/feed/advance", post(advance_handler))
        .route("/versions", get(versions_handler))
        .route("/versions/:constraint", get(version_handler))
        .route("/cache/:key", get(lookup_handler).delete(delete_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
