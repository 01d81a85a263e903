//! Response DTOs for the cache HTTP surface
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStatus;

/// Response body for the GET operation (GET /cache/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for the SET operation (PUT /cache)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    /// Effective TTL in seconds
    pub ttl: u64,
}

impl SetResponse {
    pub fn new(key: impl Into<String>, ttl: u64) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' cached for {}s", key, ttl),
            key,
            ttl,
        }
    }
}

/// Response body for the DELETE operation (DELETE /cache/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' invalidated", key),
            key,
        }
    }
}

/// Response body for pattern invalidation (POST /invalidate)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Success message
    pub message: String,
    /// The pattern that was cleared
    pub pattern: String,
    /// Backend that handled the clear
    pub backend: &'static str,
}

impl ClearResponse {
    pub fn new(pattern: impl Into<String>, backend: &'static str) -> Self {
        let pattern = pattern.into();
        let message = if backend == "fallback" {
            format!("Fallback store fully cleared for '{}'", pattern)
        } else {
            format!("Keys matching '{}' cleared", pattern)
        };
        Self {
            message,
            pattern,
            backend,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Backend currently serving requests
    pub active_backend: &'static str,
    /// Whether the remote backend is connected
    pub connected: bool,
    /// Fallback hits
    pub hits: u64,
    /// Fallback misses
    pub misses: u64,
    /// Fallback evictions
    pub evictions: u64,
    /// Fallback lazy expirations
    pub expirations: u64,
    /// Current number of fallback entries
    pub total_entries: usize,
    /// Current fallback byte total
    pub current_bytes: usize,
    /// Fallback hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStatus> for StatsResponse {
    fn from(status: CacheStatus) -> Self {
        let hit_rate = status.fallback.hit_rate();
        Self {
            active_backend: status.active_backend,
            connected: status.connected,
            hits: status.fallback.hits,
            misses: status.fallback.misses,
            evictions: status.fallback.evictions,
            expirations: status.fallback.expirations,
            total_entries: status.fallback.total_entries,
            current_bytes: status.fallback.current_bytes,
            hit_rate,
        }
    }
}

/// Response body for the health endpoint (GET /health)
///
/// The cache is always healthy: losing the remote backend only degrades it
/// to the fallback store.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status ("healthy" or "degraded")
    pub status: String,
    /// Backend currently serving requests
    pub backend: &'static str,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn from_status(status: &CacheStatus) -> Self {
        let degraded = status.remote_configured && !status.connected;
        Self {
            status: if degraded { "degraded" } else { "healthy" }.to_string(),
            backend: status.active_backend,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
