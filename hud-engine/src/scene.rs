//! Render-ready scene snapshot

use crate::layout::Layout;
use crate::measures::Readout;
use crate::projection::SceneGeometry;
use chrono::{DateTime, Utc};
use hud_core::model::{AlertSize, AlertStatus, ControlsState, DimTier, PandaType, ThermalStatus};
use serde::Serialize;

/// Overall HUD state derived from the controls state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HudStatus {
    #[default]
    Disengaged,
    Engaged,
    Warning,
    Alert,
}

impl HudStatus {
    pub fn from_controls(controls: &ControlsState) -> Self {
        match controls.alert_status {
            AlertStatus::UserPrompt => HudStatus::Warning,
            AlertStatus::Critical => HudStatus::Alert,
            AlertStatus::Normal if controls.enabled => HudStatus::Engaged,
            AlertStatus::Normal => HudStatus::Disengaged,
        }
    }
}

/// Everything a renderer needs to draw one frame. Built in full during a
/// tick and never modified after publication.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SceneSnapshot {
    pub frame: u64,
    pub timestamp: DateTime<Utc>,
    pub status: HudStatus,
    pub started: bool,
    pub engageable: bool,
    pub is_metric: bool,
    pub alert_size: AlertSize,

    /// False while the last calibration was rejected
    pub world_objects_visible: bool,
    pub geometry: SceneGeometry,

    pub brightness: f32,
    pub dim_tier: DimTier,
    pub brake_fade: f32,
    pub one_pedal_fade: f32,
    pub follow_level: f32,

    /// Vehicle speed in display units
    pub speed: f32,
    pub set_speed: Option<f32>,
    pub speed_limit: Option<f32>,
    /// Steering wheel icon rotation (degrees)
    pub wheel_angle: f32,
    pub lead_visible: bool,
    pub panda_type: PandaType,
    /// `None` when the device state is stale
    pub thermal_status: Option<ThermalStatus>,

    pub layout: Layout,
    pub measures: Vec<Readout>,
}
