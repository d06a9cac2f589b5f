//! Telemetry sources for OverlayHUD

pub mod demo;
pub mod scripted;

pub use demo::DemoSource;
pub use scripted::{ScriptHandle, ScriptedSource};
