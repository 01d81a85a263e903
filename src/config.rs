//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{
    DEFAULT_MAX_BYTES, DEFAULT_MAX_ENTRIES, DEFAULT_OP_TIMEOUT_MS, DEFAULT_TTL_SECONDS,
};
use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// Read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote backend URL; `None` means fallback-only mode
    pub redis_url: Option<String>,
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
    /// Maximum number of entries the fallback store can hold
    pub max_entries: usize,
    /// Maximum total serialized bytes the fallback store can hold
    pub max_bytes: usize,
    /// Connection retries after the first failed attempt
    pub connect_retries: u32,
    /// Base delay between connection attempts in milliseconds
    pub retry_delay_ms: u64,
    /// Time budget for a single remote operation in milliseconds
    pub op_timeout_ms: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Remote backend URL (default: unset, fallback only)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `CACHE_MAX_ENTRIES` - Fallback entry ceiling (default: 100)
    /// - `CACHE_MAX_BYTES` - Fallback byte ceiling (default: 50 MiB)
    /// - `CACHE_CONNECT_RETRIES` - Connect retries (default: 3)
    /// - `CACHE_RETRY_DELAY_MS` - Base connect retry delay (default: 1000)
    /// - `CACHE_OP_TIMEOUT_MS` - Remote operation timeout (default: 500)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    ///
    /// Unset variables take their default; a set variable that does not parse
    /// is a `CacheError::Config`.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            redis_url: env::var("REDIS_URL")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            default_ttl: parse_var("CACHE_DEFAULT_TTL", defaults.default_ttl)?,
            max_entries: parse_var("CACHE_MAX_ENTRIES", defaults.max_entries)?,
            max_bytes: parse_var("CACHE_MAX_BYTES", defaults.max_bytes)?,
            connect_retries: parse_var("CACHE_CONNECT_RETRIES", defaults.connect_retries)?,
            retry_delay_ms: parse_var("CACHE_RETRY_DELAY_MS", defaults.retry_delay_ms)?,
            op_timeout_ms: parse_var("CACHE_OP_TIMEOUT_MS", defaults.op_timeout_ms)?,
            server_port: parse_var("SERVER_PORT", defaults.server_port)?,
        })
    }

    /// Rejects configurations the cache cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(CacheError::Config(
                "CACHE_MAX_ENTRIES must be greater than zero".to_string(),
            ));
        }
        if self.max_bytes == 0 {
            return Err(CacheError::Config(
                "CACHE_MAX_BYTES must be greater than zero".to_string(),
            ));
        }
        if self.default_ttl == 0 {
            return Err(CacheError::Config(
                "CACHE_DEFAULT_TTL must be greater than zero".to_string(),
            ));
        }
        if self.op_timeout_ms == 0 {
            return Err(CacheError::Config(
                "CACHE_OP_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-operation remote timeout.
    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }

    /// Base delay between connection attempts.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            default_ttl: DEFAULT_TTL_SECONDS,
            max_entries: DEFAULT_MAX_ENTRIES,
            max_bytes: DEFAULT_MAX_BYTES,
            connect_retries: 3,
            retry_delay_ms: 1000,
            op_timeout_ms: DEFAULT_OP_TIMEOUT_MS,
            server_port: 3000,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| {
            CacheError::Config(format!("{} has an unparseable value '{}'", name, raw))
        }),
        _ => Ok(default),
    }
}
