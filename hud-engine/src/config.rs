//! Engine configuration
//!
//! Every tunable constant of the projection, animation and layout pipeline
//! lives here. The binary loads overrides from the JSON file named by
//! `HUD_CONFIG`; missing fields keep their defaults.

use crate::error::{EngineError, Result};
use hud_core::model::DimTier;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tick rate of the driver
    pub ui_freq_hz: u32,
    /// Rate at which the settings store is re-read
    pub settings_poll_hz: f32,
    /// Silence after which a topic is considered stale
    pub stale_timeout_secs: f32,
    pub camera: CameraConfig,
    pub display: DisplayConfig,
    pub draw: DrawConfig,
    pub dimming: DimmingConfig,
    pub fades: FadeConfig,
}

/// Road camera intrinsics (pixels)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub framebuffer_width: i32,
    pub framebuffer_height: i32,
    /// Focal length the overlay is drawn at; zoom = zoom_reference / fx
    pub zoom_reference: f32,
    pub y_offset: f32,
    /// Pixels outside the framebuffer that still count as visible
    pub clip_margin: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawConfig {
    pub min_draw_distance: f32,
    pub max_draw_distance: f32,
    /// Multiplier applied to the lead distance before truncating the path
    pub lead_gap_scale: f32,
    pub lead_gap_fraction: f32,
    pub lead_gap_cap: f32,
    pub min_lead_draw_distance: f32,
    pub lead_prob_threshold: f32,
    pub lane_line_width_scale: f32,
    pub road_edge_half_width: f32,
    pub path_half_width: f32,
    /// Camera height above the road
    pub path_z_offset: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimmingConfig {
    /// Brightness per tier, dimmest first
    pub tiers: [f32; 3],
    pub fade_up_secs: f32,
    pub fade_down_secs: f32,
    /// Tier forced (and snapped to) on a critical alert
    pub critical_tier: DimTier,
    /// Tier shift applied to the selected tier while a warning is shown
    pub warning_shift: i8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeConfig {
    pub fade_secs: f32,
    pub brake_threshold_percent: i32,
    /// One-pedal fade holds still for this long after an on-road session starts
    pub one_pedal_holdoff_secs: f32,
    pub one_pedal_domain: (f32, f32),
    pub follow_level_secs: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ui_freq_hz: 20,
            settings_poll_hz: 10.0,
            stale_timeout_secs: 5.0,
            camera: CameraConfig::default(),
            display: DisplayConfig::default(),
            draw: DrawConfig::default(),
            dimming: DimmingConfig::default(),
            fades: FadeConfig::default(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 1164,
            height: 874,
            fx: 910.0,
            fy: 910.0,
            cx: 582.0,
            cy: 437.0,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            framebuffer_width: 1920,
            framebuffer_height: 1080,
            zoom_reference: 2138.5,
            y_offset: 0.0,
            clip_margin: 500.0,
        }
    }
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            min_draw_distance: 10.0,
            max_draw_distance: 100.0,
            lead_gap_scale: 2.0,
            lead_gap_fraction: 0.35,
            lead_gap_cap: 10.0,
            min_lead_draw_distance: 0.0,
            lead_prob_threshold: 0.5,
            lane_line_width_scale: 0.025,
            road_edge_half_width: 0.025,
            path_half_width: 0.5,
            path_z_offset: 1.22,
        }
    }
}

impl Default for DimmingConfig {
    fn default() -> Self {
        Self {
            tiers: [0.01, 0.5, 1.0],
            fade_up_secs: 0.5,
            fade_down_secs: 2.0,
            critical_tier: DimTier::Dimmest,
            warning_shift: -1,
        }
    }
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            fade_secs: 0.3,
            brake_threshold_percent: 50,
            one_pedal_holdoff_secs: 3.0,
            one_pedal_domain: (-1.0, 1.0),
            follow_level_secs: 0.5,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Number of ticks of silence after which a topic is stale
    pub fn stale_timeout_ticks(&self) -> u64 {
        (self.stale_timeout_secs * self.ui_freq_hz as f32).round() as u64
    }

    /// Ticks between two reads of the settings store
    pub fn settings_poll_ticks(&self) -> u64 {
        ((self.ui_freq_hz as f32 / self.settings_poll_hz).round() as u64).max(1)
    }

    pub fn validate(&self) -> Result<()> {
        fn invalid(msg: impl Into<String>) -> Result<()> {
            Err(EngineError::InvalidConfig(msg.into()))
        }
        fn positive(name: &str, v: f32) -> Result<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                invalid(format!("{} must be positive, got {}", name, v))
            }
        }

        if self.ui_freq_hz == 0 {
            return invalid("ui_freq_hz must be non-zero");
        }
        positive("settings_poll_hz", self.settings_poll_hz)?;
        positive("stale_timeout_secs", self.stale_timeout_secs)?;
        positive("camera.fx", self.camera.fx)?;
        positive("camera.fy", self.camera.fy)?;
        positive("display.zoom_reference", self.display.zoom_reference)?;
        if self.display.framebuffer_width <= 0 || self.display.framebuffer_height <= 0 {
            return invalid("framebuffer dimensions must be positive");
        }
        if !(self.display.clip_margin >= 0.0) {
            return invalid("display.clip_margin must be non-negative");
        }

        let d = &self.draw;
        positive("draw.min_draw_distance", d.min_draw_distance)?;
        if d.max_draw_distance < d.min_draw_distance {
            return invalid("draw.max_draw_distance must be >= min_draw_distance");
        }
        if !(0.0..=d.max_draw_distance).contains(&d.min_lead_draw_distance) {
            return invalid("draw.min_lead_draw_distance must lie in [0, max_draw_distance]");
        }
        positive("draw.lead_gap_scale", d.lead_gap_scale)?;

        let tiers = &self.dimming.tiers;
        if !tiers.iter().all(|t| *t > 0.0 && *t <= 1.0) || !tiers.windows(2).all(|w| w[0] < w[1]) {
            return invalid("dimming.tiers must be ascending within (0, 1]");
        }
        positive("dimming.fade_up_secs", self.dimming.fade_up_secs)?;
        positive("dimming.fade_down_secs", self.dimming.fade_down_secs)?;

        let f = &self.fades;
        positive("fades.fade_secs", f.fade_secs)?;
        positive("fades.follow_level_secs", f.follow_level_secs)?;
        if !(f.one_pedal_holdoff_secs >= 0.0) {
            return invalid("fades.one_pedal_holdoff_secs must be non-negative");
        }
        let (lo, hi) = f.one_pedal_domain;
        if !(lo < hi) {
            return invalid("fades.one_pedal_domain must be an increasing pair");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.stale_timeout_ticks(), 100);
        assert_eq!(config.settings_poll_ticks(), 2);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{"display":{"clip_margin":1000}}"#).unwrap();
        assert_eq!(config.display.clip_margin, 1000.0);
        assert_eq!(config.display.framebuffer_width, 1920);
        assert_eq!(config.ui_freq_hz, 20);
    }

    #[test]
    fn test_rejects_descending_tiers() {
        let err = EngineConfig::from_json_str(r#"{"dimming":{"tiers":[1.0,0.5,0.01]}}"#)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = EngineConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, EngineError::Json(_)));
    }

    #[test]
    fn test_rejects_inverted_domain() {
        let mut config = EngineConfig::default();
        config.fades.one_pedal_domain = (1.0, -1.0);
        assert!(config.validate().is_err());
    }
}
