//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    admission_control, enforce_deadline, get_handler, health_handler, method_not_allowed,
    put_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /put` - Insert or update a key-value pair
/// - `GET /get?key=` - Retrieve a value by key
/// - `GET /stats` - Get cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Admission control on `/put` and `/get`: 429 once the in-flight limit is hit
/// - Deadline: 408 with an error body after the configured request timeout
/// - Wrong method on `/put` or `/get`: 405 with an error body
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/put", post(put_handler).fallback(method_not_allowed))
        .route("/get", get(get_handler).fallback(method_not_allowed))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admission_control,
        ))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_deadline,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
