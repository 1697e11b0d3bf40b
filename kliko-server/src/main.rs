//! HTTP service answering "which containers are near this one?" for kliko.

mod config;
mod error;
mod routes;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use kliko_core::{QueryService, SnapshotCache, SystemClock};
use kliko_provider_spaarnelanden as spaarnelanden;
use reqwest::Client;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let config = Config::from_env()?;

    // HTTP + service setup
    let client = Client::builder()
        .user_agent("kliko/0.1")
        .timeout(config.upstream_timeout)
        .build()?;
    let plugin = spaarnelanden::plugin_with_url(client, config.upstream_url.clone());
    let cache = Arc::new(SnapshotCache::new(Arc::new(SystemClock)));
    let service = Arc::new(QueryService::from_plugin(&plugin, cache, config.snapshot_ttl));

    info!(
        operator = %service.operator().name,
        upstream = %service.operator().url,
        ttl_secs = config.snapshot_ttl.num_seconds(),
        "query service ready"
    );

    let app = routes::router(AppState {
        service,
        default_radius_km: config.default_radius_km,
    });

    let addr = SocketAddr::new(config.server_host, config.server_port);
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}
