//! Memoize Module
//!
//! Cache-aside wrapper around async functions. Results are keyed by
//! `prefix:function_name:<json args>` and stored through `CacheService`.
//!
//! Arguments must serialize to a stable string; maps with unstable iteration
//! order produce unstable keys. Concurrent calls with the same arguments are
//! not coalesced: each caller that misses runs the function and writes the key.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::CacheService;

// == Memoize ==
/// An async function paired with the cache it memoizes through.
pub struct Memoize<F> {
    cache: Arc<CacheService>,
    key_prefix: String,
    function_name: String,
    ttl_seconds: Option<u64>,
    func: F,
}

/// Wraps `func` so its results are cached under `key_prefix:function_name:<args>`.
///
/// `ttl_seconds` of `None` uses the service's default TTL.
///
/// # Example
/// ```ignore
/// let repos = memoize(cache.clone(), "github", "list_repos", Some(600), |user: String| async move {
///     fetch_repos(&user).await
/// });
/// let first = repos.call("octocat".to_string()).await;
/// ```
pub fn memoize<F>(
    cache: Arc<CacheService>,
    key_prefix: impl Into<String>,
    function_name: impl Into<String>,
    ttl_seconds: Option<u64>,
    func: F,
) -> Memoize<F> {
    Memoize {
        cache,
        key_prefix: key_prefix.into(),
        function_name: function_name.into(),
        ttl_seconds,
        func,
    }
}

impl<F> Memoize<F> {
    /// Derives the cache key for `args`, or `None` if they cannot be serialized.
    pub fn cache_key<A: Serialize + ?Sized>(&self, args: &A) -> Option<String> {
        match serde_json::to_string(args) {
            Ok(encoded) => Some(format!(
                "{}:{}:{}",
                self.key_prefix, self.function_name, encoded
            )),
            Err(e) => {
                warn!(
                    function = %self.function_name,
                    error = %e,
                    "Memoized arguments not serializable, bypassing cache"
                );
                None
            }
        }
    }

    /// Returns the cached result for `args`, or runs the function and caches it.
    pub async fn call<A, Fut, T>(&self, args: A) -> T
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = T>,
        A: Serialize,
        T: Serialize + DeserializeOwned,
    {
        let Some(key) = self.cache_key(&args) else {
            return (self.func)(args).await;
        };

        if let Some(hit) = self.cache.get::<T>(&key).await {
            debug!(key = %key, "Memoize HIT");
            return hit;
        }

        let result = (self.func)(args).await;
        self.cache.set(&key, &result, self.ttl_seconds).await;
        result
    }

    /// Like [`Memoize::call`] for fallible functions; only `Ok` values are cached.
    pub async fn try_call<A, Fut, T, E>(&self, args: A) -> Result<T, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        A: Serialize,
        T: Serialize + DeserializeOwned,
    {
        let Some(key) = self.cache_key(&args) else {
            return (self.func)(args).await;
        };

        if let Some(hit) = self.cache.get::<T>(&key).await {
            debug!(key = %key, "Memoize HIT");
            return Ok(hit);
        }

        let value = (self.func)(args).await?;
        self.cache.set(&key, &value, self.ttl_seconds).await;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::BoundedFallbackStore;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache() -> Arc<CacheService> {
        Arc::new(CacheService::new(BoundedFallbackStore::new(100, 1024 * 1024), 300))
    }

    #[tokio::test]
    async fn test_identical_args_invoke_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let square = memoize(cache(), "analytics", "square", None, move |n: u64| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                n * n
            }
        });

        assert_eq!(square.call(7).await, 49);
        assert_eq!(square.call(7).await, 49);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(square.call(8).await, 64);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_key_layout() {
        let wrapped = memoize(cache(), "portfolio", "load", Some(60), |_: (u32, String)| async {});
        assert_eq!(
            wrapped.cache_key(&(3u32, "draft".to_string())).as_deref(),
            Some("portfolio:load:[3,\"draft\"]")
        );
    }

    #[tokio::test]
    async fn test_unserializable_args_bypass_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        // Non-string map keys cannot be encoded as JSON
        let wrapped = memoize(cache(), "ai", "score", None, move |m: HashMap<(u8, u8), u8>| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                m.len()
            }
        });

        let args: HashMap<(u8, u8), u8> = [((1, 2), 3)].into_iter().collect();
        assert_eq!(wrapped.call(args.clone()).await, 1);
        assert_eq!(wrapped.call(args).await, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_try_call_does_not_cache_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let wrapped = memoize(cache(), "github", "user", None, move |login: String| {
            let counter = counter.clone();
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst);
                if attempt == 0 {
                    Err(format!("rate limited for {}", login))
                } else {
                    Ok(login.to_uppercase())
                }
            }
        });

        assert!(wrapped.try_call("octocat".to_string()).await.is_err());
        assert_eq!(
            wrapped.try_call("octocat".to_string()).await,
            Ok("OCTOCAT".to_string())
        );
        assert_eq!(
            wrapped.try_call("octocat".to_string()).await,
            Ok("OCTOCAT".to_string())
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_blocking_call_from_sync_context() {
        let wrapped = memoize(cache(), "template", "render", None, |name: &'static str| async move {
            format!("<{}>", name)
        });

        let rendered = tokio_test::block_on(wrapped.call("hero"));
        assert_eq!(rendered, "<hero>");
    }
}
