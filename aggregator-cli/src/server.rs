//! HTTP server startup.

use std::sync::Arc;
use std::time::Duration;

use aggregator_core::{Aggregator, AppState, ResponseCache, router};
use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::metrics::Metrics;

pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    pub cache_sweep: Duration,
}

/// Serve the aggregate API until Ctrl-C.
pub async fn run(
    aggregator: Aggregator,
    cache: Arc<ResponseCache>,
    metrics: Metrics,
    opts: ServeOptions,
) -> Result<()> {
    let app = router(AppState::new(aggregator)).merge(metrics.router());

    let listener = bind(&opts.host, opts.port).await?;
    let actual_addr = listener.local_addr()?;

    spawn_cache_sweep(cache, opts.cache_sweep);

    info!("Aggregator listening on http://{actual_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Bind `host:port`; `host` may be a name, an IPv4 or a bare IPv6 address.
async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {host} port {port}"))
}

fn spawn_cache_sweep(cache: Arc<ResponseCache>, every: Duration) {
    if every.is_zero() {
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // First tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = cache.purge_expired();
            debug!(removed, remaining = cache.len(), "cache sweep");
        }
    });
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Could not listen for Ctrl-C; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
