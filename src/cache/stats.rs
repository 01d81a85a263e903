//! Fallback Statistics Module
//!
//! Tracks fallback store activity: hits, misses, evictions, lazy expirations
//! and the current memory footprint.

use serde::Serialize;

// == Fallback Stats ==
/// Counters maintained by the bounded fallback store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FallbackStats {
    /// Number of successful retrievals
    pub hits: u64,
    /// Number of failed retrievals (key absent or expired)
    pub misses: u64,
    /// Number of entries removed to satisfy capacity bounds
    pub evictions: u64,
    /// Number of entries discovered expired on access
    pub expirations: u64,
    /// Current number of entries
    pub total_entries: usize,
    /// Current sum of entry sizes in bytes
    pub current_bytes: usize,
}

impl FallbackStats {
    // == Constructor ==
    /// Creates a new FallbackStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }
}
