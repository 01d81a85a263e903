//! Cache Service Module
//!
//! Process-wide cache facade. Routes each operation to the remote backend while
//! it is connected and to the bounded fallback store otherwise.
//!
//! No operation returns an error: backend failures are logged and turned into
//! a miss (for reads) or a no-op (for writes).

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::remote::{ConnectPolicy, RedisBackend, RemoteBackend};
use crate::cache::{BoundedFallbackStore, FallbackStats, DEFAULT_OP_TIMEOUT_MS};
use crate::config::Config;
use crate::error::{CacheError, Result};

const FALLBACK: &str = "fallback";

// == Cache Status ==
/// Point-in-time view of the service, for health and stats reporting.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    /// Backend currently serving requests
    pub active_backend: &'static str,
    /// Whether a remote backend is configured at all
    pub remote_configured: bool,
    /// Whether the remote backend is connected
    pub connected: bool,
    /// Default TTL applied when callers omit one
    pub default_ttl: u64,
    /// Fallback store counters
    pub fallback: FallbackStats,
}

// == Cache Service ==
/// Dual-path cache: remote backend when connected, bounded fallback otherwise.
///
/// Construct once at startup and share it behind an `Arc`. The host drives the
/// lifecycle by calling `connect` at startup and `disconnect` on shutdown.
#[derive(Debug)]
pub struct CacheService {
    remote: Option<Arc<dyn RemoteBackend>>,
    fallback: Mutex<BoundedFallbackStore>,
    connected: AtomicBool,
    default_ttl: u64,
    op_timeout: Duration,
    connect_policy: ConnectPolicy,
}

impl CacheService {
    // == Constructors ==
    /// Creates a fallback-only service.
    pub fn new(fallback: BoundedFallbackStore, default_ttl: u64) -> Self {
        Self {
            remote: None,
            fallback: Mutex::new(fallback),
            connected: AtomicBool::new(false),
            default_ttl,
            op_timeout: Duration::from_millis(DEFAULT_OP_TIMEOUT_MS),
            connect_policy: ConnectPolicy::default(),
        }
    }

    /// Attaches a remote backend. It is not used until `connect` succeeds.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteBackend>, policy: ConnectPolicy) -> Self {
        self.remote = Some(remote);
        self.connect_policy = policy;
        self
    }

    /// Overrides the per-operation remote timeout.
    pub fn with_op_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    /// Builds the service from configuration.
    ///
    /// Fails only on invalid configuration, such as a malformed Redis URL.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let fallback = BoundedFallbackStore::new(config.max_entries, config.max_bytes);
        let mut service =
            Self::new(fallback, config.default_ttl).with_op_timeout(config.op_timeout());

        if let Some(url) = &config.redis_url {
            let connect_timeout = config.op_timeout().max(Duration::from_secs(1));
            let backend = RedisBackend::new(url, connect_timeout)?;
            let policy = ConnectPolicy::new(config.connect_retries, config.retry_delay());
            service = service.with_remote(Arc::new(backend), policy);
        }

        Ok(service)
    }

    // == Lifecycle ==
    /// Connects the remote backend, retrying per the connect policy.
    ///
    /// Failure leaves the service on the fallback store. Idempotent.
    pub async fn connect(&self) {
        let Some(remote) = &self.remote else {
            info!("No remote cache configured, running on fallback store");
            return;
        };

        if self.is_connected() {
            return;
        }

        match self.connect_policy.connect(remote.as_ref()).await {
            Ok(()) => {
                self.connected.store(true, Ordering::SeqCst);
                info!(backend = remote.name(), "Remote cache connected");
            }
            Err(e) => {
                warn!(
                    backend = remote.name(),
                    error = %e,
                    "Remote cache unavailable, running on fallback store"
                );
            }
        }
    }

    /// Closes the remote connection. Safe to call when never connected.
    pub async fn disconnect(&self) {
        let Some(remote) = &self.remote else {
            return;
        };

        let was_connected = self.connected.swap(false, Ordering::SeqCst);
        match remote.disconnect().await {
            Ok(()) if was_connected => info!(backend = remote.name(), "Remote cache disconnected"),
            Ok(()) => {}
            Err(e) => warn!(backend = remote.name(), error = %e, "Remote cache disconnect failed"),
        }
    }

    /// Whether operations are currently routed to the remote backend.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    // == Get ==
    /// Returns the cached value for `key`, or `None` on miss or any failure.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let (backend, payload) = match self.active_remote() {
            Some(remote) => {
                let payload = match self.remote_call(remote, "get", remote.get(key)).await {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(backend = remote.name(), key = %key, error = %e, "Cache get failed");
                        return None;
                    }
                };
                (remote.name(), payload)
            }
            None => (FALLBACK, self.fallback.lock().await.get(key)),
        };

        let Some(payload) = payload else {
            debug!(backend, key = %key, "Cache MISS");
            return None;
        };

        match serde_json::from_str(&payload) {
            Ok(value) => {
                debug!(backend, key = %key, "Cache HIT");
                Some(value)
            }
            Err(e) => {
                debug!(backend, key = %key, error = %e, "Cached value unreadable, miss");
                None
            }
        }
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl_seconds` (default TTL when `None`).
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl_seconds: Option<u64>) {
        let ttl = ttl_seconds.unwrap_or(self.default_ttl);
        let payload = match encode(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache value not serializable, skipping set");
                return;
            }
        };

        match self.active_remote() {
            Some(remote) => {
                let result = self
                    .remote_call(remote, "set", remote.set(key, &payload, ttl))
                    .await;
                match result {
                    Ok(()) => debug!(backend = remote.name(), key = %key, ttl, "Cache SET"),
                    Err(e) => {
                        warn!(backend = remote.name(), key = %key, error = %e, "Cache set failed")
                    }
                }
            }
            None => {
                let stored = self.fallback.lock().await.set(key.to_string(), payload, ttl);
                if stored {
                    debug!(backend = FALLBACK, key = %key, ttl, "Cache SET");
                }
            }
        }
    }

    // == Delete ==
    /// Removes `key`; absent keys and failures are both no-ops for the caller.
    pub async fn del(&self, key: &str) {
        match self.active_remote() {
            Some(remote) => match self.remote_call(remote, "del", remote.del(key)).await {
                Ok(()) => debug!(backend = remote.name(), key = %key, "Cache DEL"),
                Err(e) => {
                    warn!(backend = remote.name(), key = %key, error = %e, "Cache del failed")
                }
            },
            None => {
                self.fallback.lock().await.delete(key);
                debug!(backend = FALLBACK, key = %key, "Cache DEL");
            }
        }
    }

    // == Clear Pattern ==
    /// Invalidates keys matching a glob `pattern`.
    ///
    /// Only a connected remote backend with pattern support clears selectively.
    /// In every other case the whole fallback store is cleared, whatever the
    /// pattern.
    pub async fn clear_pattern(&self, pattern: &str) {
        if let Some(remote) = self.active_remote() {
            match self
                .remote_call(remote, "keys_matching", remote.keys_matching(pattern))
                .await
            {
                Ok(keys) => {
                    match self
                        .remote_call(remote, "del_many", remote.del_many(&keys))
                        .await
                    {
                        Ok(deleted) => info!(
                            backend = remote.name(),
                            pattern = %pattern,
                            deleted,
                            "Cache pattern cleared"
                        ),
                        Err(e) => warn!(
                            backend = remote.name(),
                            pattern = %pattern,
                            error = %e,
                            "Cache pattern delete failed"
                        ),
                    }
                    return;
                }
                Err(CacheError::Unsupported(reason)) => {
                    debug!(backend = remote.name(), reason = %reason, "Pattern query unsupported");
                }
                Err(e) => {
                    warn!(
                        backend = remote.name(),
                        pattern = %pattern,
                        error = %e,
                        "Cache pattern query failed"
                    );
                    return;
                }
            }
        }

        let cleared = self.fallback.lock().await.clear();
        info!(
            backend = FALLBACK,
            pattern = %pattern,
            cleared,
            "Fallback store fully cleared for pattern"
        );
    }

    // == Status ==
    /// Returns a snapshot of connection state and fallback counters.
    pub async fn status(&self) -> CacheStatus {
        let connected = self.is_connected();
        let active_backend = match (&self.remote, connected) {
            (Some(remote), true) => remote.name(),
            _ => FALLBACK,
        };

        CacheStatus {
            active_backend,
            remote_configured: self.remote.is_some(),
            connected,
            default_ttl: self.default_ttl,
            fallback: self.fallback.lock().await.stats(),
        }
    }

    // == Internals ==
    fn active_remote(&self) -> Option<&Arc<dyn RemoteBackend>> {
        self.remote.as_ref().filter(|_| self.is_connected())
    }

    /// Applies the operation timeout and drops to the fallback store when the
    /// remote reports a lost connection.
    async fn remote_call<T>(
        &self,
        remote: &Arc<dyn RemoteBackend>,
        op: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let result = match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(format!(
                "{} exceeded {}ms",
                op,
                self.op_timeout.as_millis()
            ))),
        };

        if let Err(e) = &result {
            if e.is_connection() && self.connected.swap(false, Ordering::SeqCst) {
                warn!(
                    backend = remote.name(),
                    error = %e,
                    "Remote cache connection lost, switching to fallback store"
                );
            }
        }

        result
    }

    #[cfg(test)]
    pub(crate) async fn fallback_len(&self) -> usize {
        self.fallback.lock().await.len()
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}
