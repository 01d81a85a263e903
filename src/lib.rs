//! Folio Cache - best-effort cache layer
//!
//! A remote Redis backend when reachable, a bounded in-process fallback store
//! otherwise, and a memoizing wrapper for expensive async calls. Cache failures
//! never reach callers; they only cost performance.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod keys;
pub mod models;

pub use api::AppState;
pub use cache::{memoize, CacheService, Memoize};
pub use config::Config;
pub use keys::KeyNamespace;
