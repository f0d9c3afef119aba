//! Blueskid Ledger Server
//!
//! Serves the assertion protocol over HTTP and keeps the identity ledger in
//! memory for the lifetime of the process.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blueskid_server::{adapters, routes, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "blueskid_server=debug,blueskid_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!(?config, "Loaded configuration");
    if config.twitter_bearer_token.is_none() {
        tracing::warn!("TWITTER_BEARER_TOKEN not set, tweets cannot be fetched");
    }

    // Create app state
    let registry = adapters::default_registry(&config)?;
    tracing::info!(platforms = ?registry.platforms(), "Registered adapters");
    let state = Arc::new(AppState::new(registry));

    // Create router
    let app = routes::create_router(state);

    // Start server
    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Ledger server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
