//! API Handlers
//!
//! HTTP request handlers over the shared `CacheService`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::cache::CacheService;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearRequest, ClearResponse, DeleteResponse, GetResponse, HealthResponse, SetRequest,
    SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Process-wide cache service
    pub cache: Arc<CacheService>,
}

impl AppState {
    /// Creates a new AppState around an existing service.
    pub fn new(cache: Arc<CacheService>) -> Self {
        Self { cache }
    }
}

/// Handler for PUT /cache
///
/// Stores a JSON value with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.unwrap_or_else(|| state.cache.default_ttl());
    state.cache.set(&req.key, &req.value, Some(ttl)).await;

    Ok(Json(SetResponse::new(req.key, ttl)))
}

/// Handler for GET /cache/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get::<Value>(&key).await {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /cache/:key
///
/// Succeeds whether or not the key was present.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    state.cache.del(&key).await;
    Json(DeleteResponse::new(key))
}

/// Handler for POST /invalidate
pub async fn clear_handler(
    State(state): State<AppState>,
    Json(req): Json<ClearRequest>,
) -> Result<Json<ClearResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.cache.clear_pattern(&req.pattern).await;
    let backend = state.cache.status().await.active_backend;

    Ok(Json(ClearResponse::new(req.pattern, backend)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.status().await))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = state.cache.status().await;
    Json(HealthResponse::from_status(&status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::BoundedFallbackStore;
    use serde_json::json;

    fn state() -> AppState {
        AppState::new(Arc::new(CacheService::new(
            BoundedFallbackStore::new(100, 1024 * 1024),
            300,
        )))
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = state();

        let req = SetRequest {
            key: "portfolio:7".to_string(),
            value: json!({"title": "Portfolio"}),
            ttl: None,
        };
        let response = set_handler(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(response.ttl, 300);

        let response = get_handler(State(state), Path("portfolio:7".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, json!({"title": "Portfolio"}));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let result = get_handler(State(state()), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = state();

        let req = SetRequest {
            key: "ai:draft".to_string(),
            value: json!("text"),
            ttl: Some(30),
        };
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        delete_handler(State(state.clone()), Path("ai:draft".to_string())).await;

        let result = get_handler(State(state), Path("ai:draft".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_clear_handler_reports_fallback() {
        let state = state();
        state.cache.set("analytics:1", &1, None).await;

        let req = ClearRequest {
            pattern: "portfolio:*".to_string(),
        };
        let response = clear_handler(State(state.clone()), Json(req)).await.unwrap();

        assert_eq!(response.backend, "fallback");
        assert!(state.cache.get::<i32>("analytics:1").await.is_none());
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let response = stats_handler(State(state())).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
        assert!(!response.connected);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler(State(state())).await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.backend, "fallback");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let req = SetRequest {
            key: "".to_string(),
            value: json!(1),
            ttl: None,
        };
        let result = set_handler(State(state()), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }
}
