// API Server Binary Entry Point
//
// Purpose: Serve a Doxygen search directory over HTTP
// Usage: SEARCH_DIR=doc/html/search cargo run --features api --bin api_server

use anyhow::Context;
use doxy_search_index::{AppState, ServerConfig, create_router};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "doxy_search_index=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");

    let config = ServerConfig::from_env().context("Invalid server configuration")?;

    tracing::info!("Configuration:");
    tracing::info!("  SEARCH_DIR: {}", config.search_dir.display());
    tracing::info!("  PORT: {}", config.port);
    tracing::info!("  CACHE_CAPACITY: {}", config.cache_capacity);
    tracing::info!("  CACHE_TTL_SECS: {}", config.cache_ttl.as_secs());

    let state = AppState::new(&config)
        .await
        .with_context(|| format!("Failed to load search catalog from {}", config.search_dir.display()))?;
    tracing::info!("Application state initialized successfully");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
