//! OverlayHUD Core Library
//!
//! This crate provides the telemetry topic model, the payload types and the
//! source traits shared by the telemetry producers and the HUD engine.

pub mod model;
pub mod source;
pub mod units;

pub use model::{HudSettings, TelemetryMessage, Topic};
pub use source::{MemorySettings, SettingsStore, TelemetrySource};
