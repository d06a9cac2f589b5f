//! Telemetry topic and payload model
//!
//! Every message that reaches the HUD engine is a [`TelemetryMessage`]: a
//! tagged union keyed by [`Topic`] carrying one typed payload. Payloads are
//! plain data and implement `Default`, which is the documented value a
//! consumer sees for a topic that has never been received.
//!
//! Coordinate system for model geometry: calibrated car frame
//! - X: Forward (positive = ahead of the car)
//! - Y: Right (positive = right side)
//! - Z: Down (positive = toward the road)

use crate::units::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of samples in every model trajectory
pub const TRAJECTORY_SIZE: usize = 33;

/// Longitudinal extent of the model's trajectories (meters)
pub const MAX_MODEL_DISTANCE: f32 = 192.0;

/// Longitudinal sample positions used by the model: quadratic spacing out to
/// [`MAX_MODEL_DISTANCE`].
pub fn x_idxs() -> [f32; TRAJECTORY_SIZE] {
    let mut out = [0.0; TRAJECTORY_SIZE];
    let last = (TRAJECTORY_SIZE - 1) as f32;
    for (i, x) in out.iter_mut().enumerate() {
        let r = i as f32 / last;
        *x = MAX_MODEL_DISTANCE * r * r;
    }
    out
}

// === Topics ===

/// Named telemetry channels consumed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Topic {
    ModelV2,
    CarState,
    ControlsState,
    LiveCalibration,
    DeviceState,
    PandaState,
    RadarState,
    LongitudinalPlan,
    LateralPlan,
    GpsLocation,
    LiveLocation,
    Settings,
}

impl Topic {
    pub const COUNT: usize = 12;

    pub const ALL: [Topic; Topic::COUNT] = [
        Topic::ModelV2,
        Topic::CarState,
        Topic::ControlsState,
        Topic::LiveCalibration,
        Topic::DeviceState,
        Topic::PandaState,
        Topic::RadarState,
        Topic::LongitudinalPlan,
        Topic::LateralPlan,
        Topic::GpsLocation,
        Topic::LiveLocation,
        Topic::Settings,
    ];

    /// Wire name of the topic
    pub fn name(&self) -> &'static str {
        match self {
            Topic::ModelV2 => "modelV2",
            Topic::CarState => "carState",
            Topic::ControlsState => "controlsState",
            Topic::LiveCalibration => "liveCalibration",
            Topic::DeviceState => "deviceState",
            Topic::PandaState => "pandaState",
            Topic::RadarState => "radarState",
            Topic::LongitudinalPlan => "longitudinalPlan",
            Topic::LateralPlan => "lateralPlan",
            Topic::GpsLocation => "gpsLocation",
            Topic::LiveLocation => "liveLocation",
            Topic::Settings => "settings",
        }
    }

    /// Dense index, usable for per-topic tables
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown topic: {0}")]
pub struct UnknownTopic(pub String);

impl FromStr for Topic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTopic(s.to_string()))
    }
}

// === Messages ===

/// One telemetry message as delivered by a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "payload", rename_all = "camelCase")]
pub enum TelemetryMessage {
    ModelV2(ModelGeometry),
    CarState(CarState),
    ControlsState(ControlsState),
    LiveCalibration(LiveCalibration),
    DeviceState(DeviceState),
    PandaState(PandaState),
    RadarState(RadarState),
    LongitudinalPlan(LongitudinalPlan),
    LateralPlan(LateralPlan),
    GpsLocation(GpsLocation),
    LiveLocation(LiveLocation),
    Settings(HudSettings),
}

impl TelemetryMessage {
    pub fn topic(&self) -> Topic {
        match self {
            TelemetryMessage::ModelV2(_) => Topic::ModelV2,
            TelemetryMessage::CarState(_) => Topic::CarState,
            TelemetryMessage::ControlsState(_) => Topic::ControlsState,
            TelemetryMessage::LiveCalibration(_) => Topic::LiveCalibration,
            TelemetryMessage::DeviceState(_) => Topic::DeviceState,
            TelemetryMessage::PandaState(_) => Topic::PandaState,
            TelemetryMessage::RadarState(_) => Topic::RadarState,
            TelemetryMessage::LongitudinalPlan(_) => Topic::LongitudinalPlan,
            TelemetryMessage::LateralPlan(_) => Topic::LateralPlan,
            TelemetryMessage::GpsLocation(_) => Topic::GpsLocation,
            TelemetryMessage::LiveLocation(_) => Topic::LiveLocation,
            TelemetryMessage::Settings(_) => Topic::Settings,
        }
    }
}

// === Perception model ===

/// A sampled 3D line in the calibrated car frame (meters)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trajectory {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
}

impl Trajectory {
    /// Build a full-length trajectory on the model's sample grid, with the
    /// lateral and vertical offset at each longitudinal position given by `f`.
    pub fn along<F: Fn(f32) -> (f32, f32)>(f: F) -> Self {
        let xs = x_idxs();
        let mut line = Trajectory {
            x: Vec::with_capacity(TRAJECTORY_SIZE),
            y: Vec::with_capacity(TRAJECTORY_SIZE),
            z: Vec::with_capacity(TRAJECTORY_SIZE),
        };
        for x in xs {
            let (y, z) = f(x);
            line.x.push(x);
            line.y.push(y);
            line.z.push(z);
        }
        line
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Lead vehicle prediction at the first model timestep
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadPrediction {
    /// Probability that the lead exists (0.0 to 1.0)
    pub prob: f32,
    /// Longitudinal distance (meters)
    pub x: f32,
    /// Lateral offset (meters)
    pub y: f32,
    /// Relative velocity (m/s, negative = closing)
    pub v: f32,
}

/// Perception model output: driven path, lane lines, road edges and leads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelGeometry {
    pub position: Trajectory,
    /// Far left, left, right, far right
    pub lane_lines: [Trajectory; 4],
    pub lane_line_probs: [f32; 4],
    /// Left, right
    pub road_edges: [Trajectory; 2],
    pub road_edge_stds: [f32; 2],
    pub leads: [LeadPrediction; 2],
}

// === Vehicle ===

/// Vehicle kinematics and driver-facing car state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarState {
    pub v_ego: MetersPerSecond,
    pub a_ego: MetersPerSecondSquared,
    pub steering_angle: Degrees,
    pub steering_pressed: bool,
    pub steering_torque_eps: NewtonMeters,
    pub engine_rpm: Rpm,
    pub engine_coolant_temp: Celsius,
    /// Brake effort: 1..=50 engine/regen braking, 51..=100 friction braking.
    /// Negative hides the brake indicator entirely.
    pub friction_brake_percent: i32,
    /// Body pitch relative to the road
    pub pitch: Radians,
    pub one_pedal_active: bool,
    pub coast_one_pedal_active: bool,
    pub lk_mode: bool,
    /// Follow distance setting shown on the car's cluster (1-3)
    pub read_distance_lines: u8,
    pub hvb_voltage: Volts,
    pub hvb_current: Amperes,
    /// High voltage battery power (kW, positive = discharging)
    pub hvb_wattage: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    #[default]
    Normal,
    UserPrompt,
    Critical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSize {
    #[default]
    None,
    Small,
    Mid,
    Full,
}

/// Cruise controller state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsState {
    pub enabled: bool,
    pub engageable: bool,
    pub alert_status: AlertStatus,
    pub alert_size: AlertSize,
    /// Set speed in km/h; 0 or [`SET_SPEED_NA`] when not set
    pub v_cruise: f32,
    /// Steering angle requested by the lateral controller (degrees)
    pub steering_angle_desired: Degrees,
}

/// Sentinel `v_cruise` meaning "no set speed"
pub const SET_SPEED_NA: f32 = 255.0;

/// Live calibration: roll, pitch, yaw of the device relative to the car
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveCalibration {
    pub rpy_calib: [f32; 3],
}

// === Device ===

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThermalStatus {
    #[default]
    Green,
    Yellow,
    Red,
    Danger,
}

/// Device thermal, load and storage status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceState {
    pub started: bool,
    pub cpu_temp_c: Vec<f32>,
    pub cpu_usage_percent: Vec<u8>,
    pub memory_temp_c: Celsius,
    pub ambient_temp_c: Celsius,
    pub thermal_status: ThermalStatus,
    pub fan_speed_percent: u8,
    pub memory_usage_percent: u8,
    pub free_space_percent: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PandaType {
    #[default]
    Unknown,
    WhitePanda,
    GreyPanda,
    BlackPanda,
    Pedal,
    Uno,
    Dos,
    RedPanda,
}

/// Vehicle interface board status
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PandaState {
    pub panda_type: PandaType,
    pub ignition_line: bool,
    pub ignition_can: bool,
}

impl PandaState {
    pub fn ignition(&self) -> bool {
        self.ignition_line || self.ignition_can
    }
}

// === Planning ===

/// Radar-tracked lead vehicle
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarLead {
    pub status: bool,
    pub d_rel: Meters,
    pub v_rel: MetersPerSecond,
    pub v_lead: MetersPerSecond,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarState {
    pub lead_one: RadarLead,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedLimitControlState {
    #[default]
    Inactive,
    TempInactive,
    Adapting,
    Active,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisionTurnState {
    #[default]
    Disabled,
    Entering,
    Turning,
    Leaving,
}

/// Longitudinal planner output relevant to display
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongitudinalPlan {
    /// Desired time gap to the lead (seconds)
    pub desired_follow_distance: f32,
    pub lead_dist_cost: f32,
    pub lead_accel_cost: f32,
    pub stopping_distance: Meters,
    /// Continuous follow level in [0, 2] (close, medium, far)
    pub dynamic_follow_level: f32,
    pub speed_limit: MetersPerSecond,
    pub speed_limit_offset: MetersPerSecond,
    pub dist_to_speed_limit: Meters,
    pub is_map_speed_limit: bool,
    pub speed_limit_control_state: SpeedLimitControlState,
    pub vision_turn_state: VisionTurnState,
    pub vision_turn_speed: MetersPerSecond,
    pub vision_current_lat_accel: MetersPerSecondSquared,
    pub vision_max_v_current_curvature: MetersPerSecond,
    pub vision_max_predicted_lat_accel: MetersPerSecondSquared,
}

/// Lateral planner output relevant to display
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LateralPlan {
    pub lane_width: Meters,
    pub d_prob: f32,
    pub l_prob: f32,
    pub r_prob: f32,
    pub laneless_mode: bool,
}

// === Location ===

/// GNSS fix quality and altitude
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsLocation {
    /// Horizontal accuracy; 0 means no fix
    pub accuracy: Meters,
    pub altitude: Meters,
    pub satellite_count: u16,
}

/// Fused localizer output
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveLocation {
    pub gps_ok: bool,
    pub lat_accel: MetersPerSecondSquared,
}

// === Settings ===

/// Screen brightness tier selected by the driver; index 0 is the dimmest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimTier {
    Dimmest,
    Dim,
    #[default]
    Bright,
}

impl DimTier {
    pub const ALL: [DimTier; 3] = [DimTier::Dimmest, DimTier::Dim, DimTier::Bright];
    pub const BRIGHTEST: DimTier = DimTier::Bright;

    pub fn index(self) -> usize {
        self as usize
    }

    /// Move `steps` tiers (negative = dimmer), saturating at both ends
    pub fn shifted(self, steps: i8) -> DimTier {
        let idx = (self.index() as i32 + steps as i32).clamp(0, DimTier::ALL.len() as i32 - 1);
        DimTier::ALL[idx as usize]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccelMode {
    #[default]
    Stock,
    Sport,
    Eco,
    Creep,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanelessMode {
    #[default]
    LaneOnly,
    Laneless,
    Auto,
}

/// Maximum number of measure slots on screen
pub const MAX_MEASURE_SLOTS: usize = 10;

/// Indicator shown in a measure slot. The declaration order is the order
/// the driver cycles through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureKind {
    SteeringAngle,
    DesiredSteeringAngle,
    SteeringTorqueEps,
    EngineRpm,
    EngineRpmTempC,
    EngineRpmTempF,
    CoolantTempC,
    CoolantTempF,
    Acceleration,
    LatAccel,
    Altitude,
    PercentGrade,
    PercentGradeDevice,
    FollowLevel,
    LeadTtc,
    LeadDistanceLength,
    LeadDistanceTime,
    LeadDesiredDistanceLength,
    LeadDesiredDistanceTime,
    LeadCosts,
    LeadVelocityRelative,
    LeadVelocityAbs,
    GpsAccuracy,
    CpuTempAndPercentF,
    CpuTempAndPercentC,
    CpuTempF,
    CpuTempC,
    CpuPercent,
    MemoryTempF,
    MemoryTempC,
    AmbientTempF,
    AmbientTempC,
    FanSpeedPercent,
    MemoryUsagePercent,
    FreeSpaceStorage,
    HvbVoltage,
    HvbCurrent,
    HvbWattage,
    HvbWattVolt,
    VisionCurLatAccel,
    VisionMaxVForCurCurv,
    VisionMaxPredLatAccel,
}

impl MeasureKind {
    pub const COUNT: usize = 42;

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Driver-facing settings, polled at low frequency from the key/value store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HudSettings {
    pub is_metric: bool,
    pub screen_dim_mode: DimTier,
    pub disable_disengage_on_gas: bool,
    pub one_pedal_mode: bool,
    pub one_pedal_engage_on_gas: bool,
    pub one_pedal_pause_steering: bool,
    pub accel_mode_button: bool,
    pub accel_mode: AccelMode,
    pub dynamic_follow_button: bool,
    pub dynamic_follow_active: bool,
    pub end_to_end: bool,
    pub laneless_mode: LanelessMode,
    pub speed_limit_control: bool,
    pub show_debug_ui: bool,
    pub wheel_rotates: bool,
    pub measure_slots: Vec<MeasureKind>,
}

impl Default for HudSettings {
    fn default() -> Self {
        Self {
            is_metric: true,
            screen_dim_mode: DimTier::Bright,
            disable_disengage_on_gas: false,
            one_pedal_mode: false,
            one_pedal_engage_on_gas: false,
            one_pedal_pause_steering: false,
            accel_mode_button: false,
            accel_mode: AccelMode::Stock,
            dynamic_follow_button: false,
            dynamic_follow_active: false,
            end_to_end: false,
            laneless_mode: LanelessMode::LaneOnly,
            speed_limit_control: false,
            show_debug_ui: false,
            wheel_rotates: true,
            measure_slots: vec![
                MeasureKind::CpuTempAndPercentC,
                MeasureKind::LeadDistanceLength,
                MeasureKind::PercentGradeDevice,
            ],
        }
    }
}

impl HudSettings {
    /// Number of measure slots to draw (at most [`MAX_MEASURE_SLOTS`])
    pub fn measure_slot_count(&self) -> usize {
        self.measure_slots.len().min(MAX_MEASURE_SLOTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_all_matches_index_order() {
        for (i, topic) in Topic::ALL.iter().enumerate() {
            assert_eq!(topic.index(), i, "{} out of order", topic);
        }
    }

    #[test]
    fn test_topic_from_str() {
        assert_eq!("carState".parse::<Topic>(), Ok(Topic::CarState));
        assert_eq!(" modelv2 ".parse::<Topic>(), Ok(Topic::ModelV2));
        assert!("sensorEvents".parse::<Topic>().is_err());
    }

    #[test]
    fn test_message_topic_tag() {
        let msg = TelemetryMessage::RadarState(RadarState::default());
        assert_eq!(msg.topic(), Topic::RadarState);

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["topic"], "radarState");
        assert!(json["payload"]["lead_one"].is_object());
    }

    #[test]
    fn test_message_deserializes_with_partial_payload() {
        let json = r#"{"topic":"carState","payload":{"friction_brake_percent":75}}"#;
        let msg: TelemetryMessage = serde_json::from_str(json).unwrap();
        match msg {
            TelemetryMessage::CarState(cs) => {
                assert_eq!(cs.friction_brake_percent, 75);
                assert_eq!(cs.v_ego, MetersPerSecond(0.0));
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_settings_deserialize_rejects_unknown_measure() {
        let json = r#"{"measure_slots":["engine_rpm","warp_drive"]}"#;
        assert!(serde_json::from_str::<HudSettings>(json).is_err());
    }

    #[test]
    fn test_x_idxs_quadratic_spacing() {
        let xs = x_idxs();
        assert_eq!(xs[0], 0.0);
        assert!((xs[TRAJECTORY_SIZE - 1] - MAX_MODEL_DISTANCE).abs() < 1e-3);
        assert!(xs.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_trajectory_along() {
        let line = Trajectory::along(|x| (x * 0.1, 1.0));
        assert_eq!(line.len(), TRAJECTORY_SIZE);
        assert!((line.y[TRAJECTORY_SIZE - 1] - 19.2).abs() < 1e-3);
        assert!(line.z.iter().all(|z| *z == 1.0));
    }

    #[test]
    fn test_dim_tier_shift_saturates() {
        assert_eq!(DimTier::Bright.shifted(1), DimTier::Bright);
        assert_eq!(DimTier::Bright.shifted(-1), DimTier::Dim);
        assert_eq!(DimTier::Dim.shifted(-5), DimTier::Dimmest);
    }

    #[test]
    fn test_measure_kind_count() {
        assert_eq!(MeasureKind::VisionMaxPredLatAccel.index() + 1, MeasureKind::COUNT);
    }

    #[test]
    fn test_measure_slot_count_capped() {
        let settings = HudSettings {
            measure_slots: vec![MeasureKind::EngineRpm; 14],
            ..Default::default()
        };
        assert_eq!(settings.measure_slot_count(), MAX_MEASURE_SLOTS);
    }
}
