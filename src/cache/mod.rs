//! Cache Module
//!
//! Best-effort cache layer: a remote backend when connected, a bounded
//! in-process fallback otherwise, and a memoizing wrapper on top.

mod entry;
mod fallback;
mod memoize;
pub mod remote;
mod service;
mod stats;


// Re-export public types
pub use entry::CacheEntry;
pub use fallback::BoundedFallbackStore;
pub use memoize::{memoize, Memoize};
pub use remote::{ConnectPolicy, RedisBackend, RemoteBackend};
pub use service::{CacheService, CacheStatus};
pub use stats::FallbackStats;

// == Public Constants ==
/// TTL applied when callers omit one
pub const DEFAULT_TTL_SECONDS: u64 = 300;

/// Default fallback entry ceiling
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Default fallback byte ceiling
pub const DEFAULT_MAX_BYTES: usize = 50 * 1024 * 1024; // 50 MiB

/// Default time budget for one remote operation
pub const DEFAULT_OP_TIMEOUT_MS: u64 = 500;
