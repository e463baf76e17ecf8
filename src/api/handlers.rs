//! API Handlers
//!
//! HTTP request handlers and admission control for the cache server.
//! Input validation happens here; the cache engine accepts whatever it is given.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
    Json,
};
use tokio::sync::Semaphore;
use tracing::warn;

use crate::cache::{CacheStats, ShardedCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{GetParams, GetResponse, HealthResponse, PutRequest, StatusResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache engine
    pub cache: Arc<ShardedCache>,
    /// In-flight request permits
    pub permits: Arc<Semaphore>,
    /// Per-request deadline
    pub request_timeout: Duration,
}

impl AppState {
    /// Creates a new AppState around `cache` with default limits.
    pub fn new(cache: Arc<ShardedCache>) -> Self {
        Self::from_config(&Config::default(), cache)
    }

    /// Creates a new AppState using the limits from `config`.
    pub fn from_config(config: &Config, cache: Arc<ShardedCache>) -> Self {
        Self {
            cache,
            permits: Arc::new(Semaphore::new(config.max_concurrent_requests)),
            request_timeout: config.request_timeout,
        }
    }
}

/// Middleware rejecting requests once every permit is taken.
///
/// Excess requests fail fast with 429 instead of queueing.
pub async fn admission_control(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let _permit = state
        .permits
        .try_acquire()
        .map_err(|_| CacheError::TooManyRequests)?;
    Ok(next.run(request).await)
}

/// Middleware answering 408 once a request outlives the configured deadline.
pub async fn enforce_deadline(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let path = request.uri().path().to_owned();
    tokio::time::timeout(state.request_timeout, next.run(request))
        .await
        .map_err(|_| {
            warn!("Request to {} exceeded {:?}", path, state.request_timeout);
            CacheError::Timeout
        })
}

/// Fallback for known paths hit with an unsupported method.
pub async fn method_not_allowed() -> CacheError {
    CacheError::MethodNotAllowed
}

/// Handler for POST /put
///
/// Inserts or updates a key-value pair. The body is decoded as JSON whatever
/// its declared content type.
pub async fn put_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StatusResponse>> {
    let req: PutRequest = serde_json::from_slice(&body).map_err(|_| CacheError::InvalidJson)?;

    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.cache.set(req.key, req.value);

    Ok(Json(StatusResponse::inserted()))
}

/// Handler for GET /get?key=...
///
/// Retrieves a value from the cache by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Query(params): Query<GetParams>,
) -> Result<Json<GetResponse>> {
    let key = params
        .key
        .filter(|key| !key.is_empty())
        .ok_or(CacheError::MissingKey)?;

    let value = state.cache.get(&key).ok_or(CacheError::NotFound)?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
