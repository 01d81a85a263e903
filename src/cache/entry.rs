//! Cache Entry Module
//!
//! Defines the record held by the fallback store.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A single fallback-store record.
///
/// Entries are never mutated in place; an overwrite replaces the whole record.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Serialized JSON payload
    pub payload: String,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// Size of the serialized payload, used for memory accounting
    pub size_bytes: usize,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry expiring `ttl_seconds` from now.
    pub fn new(payload: String, ttl_seconds: u64) -> Self {
        let expires_at = current_timestamp_ms().saturating_add(ttl_seconds.saturating_mul(1000));
        Self::with_expiry(payload, expires_at)
    }

    /// Creates an entry with an absolute expiry timestamp.
    pub fn with_expiry(payload: String, expires_at: u64) -> Self {
        let size_bytes = payload.len();
        Self {
            payload,
            expires_at,
            size_bytes,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is absent once the current time is strictly past `expires_at`.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Expiry check against a caller-supplied clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, zero once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
