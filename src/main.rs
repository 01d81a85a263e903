//! Folio Cache - host process
//!
//! Owns the process-wide `CacheService`: connects it at startup, serves the
//! HTTP surface, and disconnects it on shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_cache::api::create_router;
use folio_cache::{AppState, CacheService, Config};

/// Main entry point for the cache host.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Build the cache service and attempt the remote connection
/// 4. Serve the HTTP surface
/// 5. On SIGINT/SIGTERM, stop serving and disconnect the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Folio Cache");

    let config = Config::from_env().context("invalid cache configuration")?;
    info!(
        remote = config.redis_url.is_some(),
        max_entries = config.max_entries,
        max_bytes = config.max_bytes,
        default_ttl = config.default_ttl,
        port = config.server_port,
        "Configuration loaded"
    );

    let cache = CacheService::from_config(&config).context("invalid cache configuration")?;
    let cache = Arc::new(cache);

    // Connection failure only leaves the cache on its fallback store
    cache.connect().await;

    let app = create_router(AppState::new(cache.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    cache.disconnect().await;

    if let Err(e) = &served {
        warn!(error = %e, "Server stopped with an error");
    }
    info!("Shutdown complete");

    served.context("server error")
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
