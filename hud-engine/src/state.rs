//! Application state shared between the tick driver and the HTTP surface

use crate::scene::SceneSnapshot;
use hud_core::source::TelemetrySource;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

/// Latest published scene. Readers always see a complete snapshot.
#[derive(Clone)]
pub struct SceneHandle {
    tx: Arc<watch::Sender<Arc<SceneSnapshot>>>,
}

impl SceneHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(SceneSnapshot::default()));
        Self { tx: Arc::new(tx) }
    }

    /// Replace the current snapshot and wake subscribers
    pub fn publish(&self, snapshot: SceneSnapshot) {
        self.tx.send_replace(Arc::new(snapshot));
    }

    pub fn latest(&self) -> Arc<SceneSnapshot> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<SceneSnapshot>> {
        self.tx.subscribe()
    }
}

impl Default for SceneHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// All registered telemetry sources
    pub sources: Arc<RwLock<Vec<Box<dyn TelemetrySource>>>>,

    /// Published scene snapshots
    pub scene: SceneHandle,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            sources: Arc::new(RwLock::new(Vec::new())),
            scene: SceneHandle::new(),
        }
    }

    /// Register a source
    pub async fn register_source(&self, source: Box<dyn TelemetrySource>) {
        let mut sources = self.sources.write().await;
        sources.push(source);
    }

    /// Subscribe to published snapshots
    pub fn subscribe(&self) -> watch::Receiver<Arc<SceneSnapshot>> {
        self.scene.subscribe()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
