//! API Handlers
//!
//! HTTP request handlers hosting the dependency cache and the demo catalog.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderName},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, info};

use crate::cache::{ConstraintVersionStore, DependencyCache, KvBackend, RequestLifecycle};
use crate::catalog::{BookQuery, Catalog};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    AdvanceRequest, AdvanceResponse, BooksParams, DeleteResponse, HealthResponse,
    LookupResponse, StatsResponse, VersionResponse, VersionsResponse,
};

/// Request header that scopes cached responses to one session.
pub const SESSION_HEADER: &str = "session-id";

/// Response header reporting whether the payload came from the cache.
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Version-checked response cache
    pub cache: DependencyCache,
    /// Hands out one tracker per computation
    pub lifecycle: RequestLifecycle,
    /// Demo data the `/books` query reads from
    pub catalog: Arc<Catalog>,
}

impl AppState {
    /// Creates a new AppState around `cache`, serving the demo catalog.
    pub fn new(cache: DependencyCache) -> Self {
        let lifecycle = RequestLifecycle::new(cache.versions().clone());
        Self {
            cache,
            lifecycle,
            catalog: Arc::new(Catalog::demo()),
        }
    }

    /// Creates a new AppState from configuration over `backend`.
    ///
    /// Seeds the version store and applies the cache options from `config`.
    pub fn from_config(config: &Config, backend: Arc<dyn KvBackend>) -> Self {
        let versions = Arc::new(ConstraintVersionStore::seeded(
            config.constraint_seed.iter().cloned(),
        ));
        let cache = DependencyCache::new(backend, versions)
            .with_store_timeout(config.store_timeout())
            .with_evict_on_stale(config.evict_on_stale);
        Self::new(cache)
    }

    fn versions(&self) -> &ConstraintVersionStore {
        self.cache.versions()
    }
}

/// Handler for GET /books?fields=...
///
/// Serves the book query from the cache when fresh; otherwise resolves it
/// inside a new tracking window and caches the result in the background.
pub async fn books_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<BooksParams>,
) -> Result<Response> {
    let query = BookQuery::parse(&params.fields)?;
    let session = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty());
    let key = query.cache_key(session);

    if let Some(payload) = state.cache.get(&key).await {
        return Ok(json_payload(payload, "HIT"));
    }

    let tracker = state.lifecycle.begin();
    let books = state.catalog.resolve_books(&query, &tracker);
    let payload = serde_json::to_string(&json!({ "books": books }))
        .map_err(|e| CacheError::Internal(e.to_string()))?;

    // The response does not wait for the write
    let _ = state.cache.set(key, payload.clone(), &tracker);

    Ok(json_payload(payload, "MISS"))
}

fn json_payload(payload: String, cache_status: &'static str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (HeaderName::from_static(CACHE_STATUS_HEADER), cache_status),
        ],
        payload,
    )
        .into_response()
}

/// Handler for POST /feed/advance
///
/// Change feed entry point: moves a constraint to a newer version.
pub async fn advance_handler(
    State(state): State<AppState>,
    Json(req): Json<AdvanceRequest>,
) -> Result<Json<AdvanceResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let outcome = state.versions().advance(req.constraint.clone(), req.version);
    info!(
        "Feed advance {} -> {} ({:?})",
        req.constraint, req.version, outcome
    );

    Ok(Json(AdvanceResponse::new(req.constraint, outcome, req.version)))
}

/// Handler for GET /versions
pub async fn versions_handler(State(state): State<AppState>) -> Json<VersionsResponse> {
    Json(VersionsResponse::new(state.versions().all()))
}

/// Handler for GET /versions/:constraint
///
/// Unknown constraints report version 0.
pub async fn version_handler(
    State(state): State<AppState>,
    Path(constraint): Path<String>,
) -> Json<VersionResponse> {
    let version = state.versions().get(&constraint);
    Json(VersionResponse::new(constraint, version))
}

/// Handler for GET /cache/:key
///
/// Raw lookup reporting hit or the reason for a miss.
pub async fn lookup_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<LookupResponse> {
    let lookup = state.cache.lookup(&key).await;
    debug!("Lookup {} -> hit: {}", key, lookup.is_hit());
    Json(LookupResponse::new(key, lookup))
}

/// Handler for DELETE /cache/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    let removed = state.cache.delete(&key).await;
    Json(DeleteResponse::new(key, removed))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let store = state.cache.backend().stats().await;
    Json(StatsResponse::new(
        state.cache.stats(),
        store,
        state.versions().len(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryBackend;
    use crate::catalog::BOOKS;

    fn test_state() -> AppState {
        AppState::from_config(&Config::default(), Arc::new(MemoryBackend::new(100, 300)))
    }

    #[tokio::test]
    async fn test_advance_handler() {
        let state = test_state();
        let req = AdvanceRequest {
            constraint: BOOKS.to_string(),
            version: 3,
        };

        let response = advance_handler(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(response.outcome, "applied");

        let version = version_handler(State(state), Path(BOOKS.to_string())).await;
        assert_eq!(version.version, 3);
    }

    #[tokio::test]
    async fn test_advance_invalid_request() {
        let state = test_state();
        let req = AdvanceRequest {
            constraint: "".to_string(),
            version: 1,
        };
        assert!(advance_handler(State(state), Json(req)).await.is_err());
    }

    #[tokio::test]
    async fn test_books_handler_rejects_unknown_field() {
        let state = test_state();
        let params = BooksParams {
            fields: "isbn".to_string(),
        };
        let result = books_handler(State(state), HeaderMap::new(), Query(params)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_lookup_and_delete_absent_key() {
        let state = test_state();

        let lookup = lookup_handler(State(state.clone()), Path("missing".to_string())).await;
        assert!(!lookup.hit);
        assert_eq!(lookup.reason, Some("absent"));

        let deleted = delete_handler(State(state), Path("missing".to_string())).await;
        assert!(!deleted.removed);
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();
        let response = stats_handler(State(state)).await;
        assert_eq!(response.cache.hits, 0);
        assert!(response.store.is_some());
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
