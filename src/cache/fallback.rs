//! Bounded Fallback Store Module
//!
//! In-process cache used whenever the remote backend is not connected. Bounded
//! by entry count and by total serialized bytes, with lazy TTL expiry.
//!
//! Eviction removes the entries that will expire soonest, not the least
//! recently used ones. A long-lived entry that is never read can therefore
//! outlive a hot entry that is close to its expiry.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, FallbackStats};

// == Bounded Fallback Store ==
/// In-memory key/value store with count and byte ceilings.
///
/// Not synchronised; `CacheService` serialises access behind a single mutex so
/// that eviction and insertion happen in one critical section.
#[derive(Debug)]
pub struct BoundedFallbackStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Maximum sum of entry sizes allowed
    max_bytes: usize,
    /// Running sum of entry sizes
    current_bytes: usize,
    /// Activity counters
    stats: FallbackStats,
}

impl BoundedFallbackStore {
    // == Constructor ==
    /// Creates an empty store with the given ceilings.
    pub fn new(max_entries: usize, max_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries,
            max_bytes,
            current_bytes: 0,
            stats: FallbackStats::new(),
        }
    }

    // == Get ==
    /// Returns the stored payload, or `None` if absent or expired.
    ///
    /// Expired entries are removed on discovery.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(),
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            debug!(key = %key, "Fallback entry expired");
            return None;
        }

        self.stats.record_hit();
        self.entries.get(key).map(|entry| entry.payload.clone())
    }

    // == Set ==
    /// Stores a payload for `ttl_seconds`, evicting first if a bound would be exceeded.
    ///
    /// Returns `false` when the payload alone is larger than the byte ceiling; such
    /// a payload is not stored and any previous value under `key` is dropped.
    pub fn set(&mut self, key: String, payload: String, ttl_seconds: u64) -> bool {
        let size_bytes = payload.len();

        if size_bytes > self.max_bytes {
            self.remove_entry(&key);
            warn!(
                key = %key,
                size_bytes,
                max_bytes = self.max_bytes,
                "Value exceeds fallback byte ceiling, not cached"
            );
            return false;
        }

        if self.entries.len() >= self.max_entries
            || self.current_bytes + size_bytes > self.max_bytes
        {
            self.evict(size_bytes);
        }

        // Overwrite replaces the whole record
        self.remove_entry(&key);

        let entry = CacheEntry::new(payload, ttl_seconds);
        self.current_bytes += entry.size_bytes;
        self.entries.insert(key, entry);
        true
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether an entry was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    // == Clear ==
    /// Removes every entry. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.current_bytes = 0;
        count
    }

    // == Evict ==
    /// Removes entries soonest-to-expire first until the count is below its
    /// ceiling and the byte total leaves 10% headroom plus room for `incoming`.
    fn evict(&mut self, incoming: usize) {
        let headroom_target = self.max_bytes - self.max_bytes / 10;
        let byte_target = headroom_target.min(self.max_bytes - incoming);

        let mut order: Vec<(u64, String)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.expires_at, key.clone()))
            .collect();
        order.sort_unstable();

        let now = current_timestamp_ms();
        let mut evicted = 0usize;
        for (expires_at, key) in order {
            if self.entries.len() < self.max_entries && self.current_bytes <= byte_target {
                break;
            }
            self.remove_entry(&key);
            if now > expires_at {
                self.stats.record_expiration();
            } else {
                self.stats.record_eviction();
            }
            evicted += 1;
        }

        debug!(
            evicted,
            remaining = self.entries.len(),
            current_bytes = self.current_bytes,
            "Fallback eviction pass"
        );
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.current_bytes -= entry.size_bytes;
        Some(entry)
    }

    // == Stats ==
    /// Returns a snapshot of the store counters.
    pub fn stats(&self) -> FallbackStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.entries.len();
        stats.current_bytes = self.current_bytes;
        stats
    }

    // == Accessors ==
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_bytes(&self) -> usize {
        self.current_bytes
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Whether an entry for `key` is held, expired or not. Does not touch stats.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[cfg(test)]
    pub(crate) fn insert_raw(&mut self, key: &str, entry: CacheEntry) {
        self.remove_entry(key);
        self.current_bytes += entry.size_bytes;
        self.entries.insert(key.to_string(), entry);
    }

    #[cfg(test)]
    pub(crate) fn summed_bytes(&self) -> usize {
        self.entries.values().map(|e| e.size_bytes).sum()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    fn store() -> BoundedFallbackStore {
        BoundedFallbackStore::new(100, 50 * 1024 * 1024)
    }

    #[test]
    fn test_store_new() {
        let store = store();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.current_bytes(), 0);
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = store();

        assert!(store.set("portfolio:1".to_string(), "{\"a\":1}".to_string(), 60));

        assert_eq!(store.get("portfolio:1").as_deref(), Some("{\"a\":1}"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.current_bytes(), 7);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = store();
        assert!(store.get("nonexistent").is_none());
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_store_delete() {
        let mut store = store();

        store.set("key1".to_string(), "\"value1\"".to_string(), 60);
        assert!(store.delete("key1"));

        assert!(store.is_empty());
        assert_eq!(store.current_bytes(), 0);
        assert!(store.get("key1").is_none());
    }

    #[test]
    fn test_store_delete_nonexistent_is_noop() {
        let mut store = store();
        store.set("key1".to_string(), "1".to_string(), 60);

        assert!(!store.delete("nonexistent"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.current_bytes(), 1);
    }

    #[test]
    fn test_store_overwrite_recomputes_size() {
        let mut store = store();

        store.set("key1".to_string(), "\"short\"".to_string(), 60);
        store.set("key1".to_string(), "\"much longer value\"".to_string(), 60);

        assert_eq!(store.get("key1").as_deref(), Some("\"much longer value\""));
        assert_eq!(store.len(), 1);
        assert_eq!(store.current_bytes(), "\"much longer value\"".len());
    }

    #[test]
    fn test_store_clear() {
        let mut store = store();
        store.set("portfolio:1".to_string(), "1".to_string(), 60);
        store.set("ai:1".to_string(), "2".to_string(), 60);

        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
        assert_eq!(store.current_bytes(), 0);
    }

    #[test]
    fn test_store_lazy_expiration() {
        let mut store = store();

        store.set("key1".to_string(), "\"value1\"".to_string(), 1);
        assert!(store.get("key1").is_some());

        sleep(Duration::from_millis(1100));

        // Still held until touched
        assert!(store.contains_key("key1"));
        assert!(store.get("key1").is_none());
        assert!(!store.contains_key("key1"));
        assert_eq!(store.current_bytes(), 0);
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_store_count_bound_evicts() {
        let mut store = BoundedFallbackStore::new(3, 1024);

        store.set("key1".to_string(), "1".to_string(), 10);
        store.set("key2".to_string(), "2".to_string(), 20);
        store.set("key3".to_string(), "3".to_string(), 30);
        store.set("key4".to_string(), "4".to_string(), 40);

        assert!(store.len() <= 3);
        assert!(store.get("key1").is_none());
        assert!(store.get("key4").is_some());
        assert!(store.stats().evictions >= 1);
    }

    #[test]
    fn test_eviction_prefers_soonest_expiry_over_recency() {
        let mut store = BoundedFallbackStore::new(3, 1024);

        store.set("short".to_string(), "1".to_string(), 10);
        store.set("medium".to_string(), "2".to_string(), 100);
        store.set("long".to_string(), "3".to_string(), 1000);

        // Reading the short-lived entry does not protect it
        assert!(store.get("short").is_some());
        assert!(store.get("short").is_some());

        store.set("new".to_string(), "4".to_string(), 500);

        assert!(store.get("short").is_none());
        assert!(store.get("medium").is_some());
        assert!(store.get("long").is_some());
        assert!(store.get("new").is_some());
    }

    #[test]
    fn test_store_byte_bound_evicts_with_headroom() {
        let mut store = BoundedFallbackStore::new(100, 100);

        for i in 0..5 {
            store.set(format!("key{}", i), "x".repeat(20), 10 + i as u64);
        }
        assert_eq!(store.current_bytes(), 100);

        store.set("key5".to_string(), "y".repeat(20), 100);

        assert!(store.current_bytes() <= 100);
        assert!(store.get("key0").is_none());
        assert!(store.get("key5").is_some());
    }

    #[test]
    fn test_store_oversized_value_not_stored() {
        let mut store = BoundedFallbackStore::new(10, 16);
        store.set("key".to_string(), "1".to_string(), 60);

        assert!(!store.set("key".to_string(), "z".repeat(17), 60));

        assert!(store.get("key").is_none());
        assert_eq!(store.current_bytes(), 0);
    }

    #[test]
    fn test_eviction_reclaims_expired_first() {
        let mut store = BoundedFallbackStore::new(2, 1024);
        let now = current_timestamp_ms();
        store.insert_raw("stale", CacheEntry::with_expiry("1".to_string(), now - 5_000));
        store.set("fresh".to_string(), "2".to_string(), 60);

        store.set("newer".to_string(), "3".to_string(), 60);

        assert!(!store.contains_key("stale"));
        assert!(store.contains_key("fresh"));
        assert_eq!(store.stats().expirations, 1);
        assert_eq!(store.current_bytes(), store.summed_bytes());
    }
}
