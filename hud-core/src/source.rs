//! Telemetry source and settings store traits

use crate::model::{HudSettings, TelemetryMessage};
use anyhow::{anyhow, Result};
use std::sync::RwLock;

/// Trait for telemetry producers feeding the engine
///
/// Each source is responsible for:
/// - Connecting to its bus, file or generator when started
/// - Returning every message received since the previous poll
///
/// Sources are polled once per tick, at the tick boundary. A poll must not
/// block: a stalled producer simply returns an empty batch.
pub trait TelemetrySource: Send + Sync {
    /// Stable identifier (e.g., "demo")
    fn key(&self) -> &str;

    /// Human readable name
    fn name(&self) -> &str;

    /// Start producing messages
    fn start(&mut self) -> Result<()>;

    /// Stop producing messages and release resources
    fn stop(&mut self) -> Result<()>;

    /// Drain the messages received since the previous poll
    ///
    /// Returns:
    /// - `Ok(messages)` (possibly empty) when the source is healthy
    /// - `Err(_)` if the source failed; the engine skips it for this tick
    fn poll(&mut self) -> Result<Vec<TelemetryMessage>>;

    /// Get whether the source is currently producing
    fn is_active(&self) -> bool;
}

/// Key/value settings store, read at low frequency
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<HudSettings>;
}

/// Settings held in memory; writable from tests and from the input handler
#[derive(Debug, Default)]
pub struct MemorySettings {
    inner: RwLock<HudSettings>,
}

impl MemorySettings {
    pub fn new(settings: HudSettings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    /// Replace the stored settings
    pub fn store(&self, settings: HudSettings) -> Result<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        *guard = settings;
        Ok(())
    }
}

impl SettingsStore for MemorySettings {
    fn load(&self) -> Result<HudSettings> {
        self.inner
            .read()
            .map(|s| s.clone())
            .map_err(|_| anyhow!("settings lock poisoned"))
    }
}
