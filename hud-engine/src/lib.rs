//! OverlayHUD engine library
//!
//! Projects perception geometry into screen space, drives the overlay
//! animations and lays out the HUD indicators, one tick at a time.

pub mod animation;
pub mod api;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod grade;
pub mod layout;
pub mod measures;
pub mod projection;
pub mod scene;
pub mod state;
pub mod store;

pub use config::EngineConfig;
pub use engine::EngineContext;
pub use error::{EngineError, Result};
pub use scene::{HudStatus, SceneSnapshot};
pub use state::{AppState, SceneHandle};
