//! OverlayHUD engine server
//!
//! Runs the tick driver against the demo drive and serves scene snapshots

use anyhow::{Context, Result};
use hud_core::{HudSettings, MemorySettings};
use hud_engine::{api, driver, state::AppState, EngineConfig};
use hud_sources::DemoSource;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

const DEFAULT_LISTEN: &str = "0.0.0.0:9100";

fn load_config() -> Result<EngineConfig> {
    match std::env::var("HUD_CONFIG") {
        Ok(path) => {
            info!("Loading engine config from {}", path);
            EngineConfig::from_json_file(&path)
                .with_context(|| format!("failed to load config {}", path))
        }
        Err(_) => Ok(EngineConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting OverlayHUD engine");

    let config = load_config()?;
    let addr: SocketAddr = std::env::var("HUD_LISTEN")
        .unwrap_or_else(|_| DEFAULT_LISTEN.to_string())
        .parse()
        .context("invalid HUD_LISTEN address")?;

    // Create application state
    let state = AppState::new();
    state.register_source(Box::new(DemoSource::new())).await;
    let settings = Arc::new(MemorySettings::new(HudSettings::default()));

    // Build the router
    let app = api::create_router(state.clone());

    // Start the tick driver in background
    let cancel = CancellationToken::new();
    let driver = tokio::spawn(driver::run(
        state.clone(),
        settings,
        config,
        cancel.clone(),
    ));

    info!("Server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    cancel.cancel();
    driver.await?;

    Ok(())
}
