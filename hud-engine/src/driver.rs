//! Tick driver
//!
//! This module handles:
//! - Starting registered sources and polling them at tick boundaries
//! - Polling the settings store at low frequency
//! - Running engine ticks at a fixed cadence
//! - Publishing each snapshot to subscribers

use crate::config::EngineConfig;
use crate::engine::EngineContext;
use crate::state::AppState;
use hud_core::model::TelemetryMessage;
use hud_core::source::SettingsStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Main driver loop; returns once `cancel` fires
pub async fn run(
    state: AppState,
    settings: Arc<dyn SettingsStore>,
    config: EngineConfig,
    cancel: CancellationToken,
) {
    start_sources(&state).await;

    let period = Duration::from_secs_f64(1.0 / config.ui_freq_hz.max(1) as f64);
    let settings_every = config.settings_poll_ticks();
    let mut engine = EngineContext::new(config);
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let epoch = Instant::now();

    info!("Tick driver started ({:?} per tick)", period);

    let mut ticks: u64 = 0;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if ticks % settings_every == 0 {
            match settings.load() {
                Ok(loaded) => engine.apply_stored_settings(loaded),
                Err(e) => warn!("Error loading settings: {}", e),
            }
        }
        ticks += 1;

        let messages = poll_sources(&state).await;
        let snapshot = engine.tick(epoch.elapsed().as_secs_f64(), messages);
        state.scene.publish(snapshot);
    }

    stop_sources(&state).await;
    info!("Tick driver stopped after {} ticks", ticks);
}

/// Start every registered source that is not already running
pub async fn start_sources(state: &AppState) {
    let mut sources = state.sources.write().await;
    for source in sources.iter_mut().filter(|s| !s.is_active()) {
        match source.start() {
            Ok(()) => info!("Source {} started", source.name()),
            Err(e) => error!("Failed to start source {}: {}", source.name(), e),
        }
    }
}

async fn stop_sources(state: &AppState) {
    let mut sources = state.sources.write().await;
    for source in sources.iter_mut().filter(|s| s.is_active()) {
        if let Err(e) = source.stop() {
            error!("Error stopping source {}: {}", source.name(), e);
        }
    }
}

/// Drain every active source. A failing source is logged and skipped.
pub async fn poll_sources(state: &AppState) -> Vec<TelemetryMessage> {
    let mut sources = state.sources.write().await;
    let mut messages = Vec::new();
    for source in sources.iter_mut().filter(|s| s.is_active()) {
        match source.poll() {
            Ok(batch) => messages.extend(batch),
            Err(e) => warn!("Error polling source {}: {}", source.key(), e),
        }
    }
    if !messages.is_empty() {
        debug!("Polled {} messages", messages.len());
    }
    messages
}
