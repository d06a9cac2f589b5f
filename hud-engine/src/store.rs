//! Telemetry snapshot store
//!
//! Holds the latest payload per topic along with per-tick update flags and
//! the frame each topic was last received on. Late or unknown data is never
//! an error; a silent topic simply becomes stale.

use hud_core::model::*;

#[derive(Debug, Default)]
pub struct TelemetryStore {
    frame: u64,
    updated: [bool; Topic::COUNT],
    last_frame: [Option<u64>; Topic::COUNT],

    model: ModelGeometry,
    car_state: CarState,
    controls_state: ControlsState,
    live_calibration: LiveCalibration,
    device_state: DeviceState,
    panda_state: PandaState,
    radar_state: RadarState,
    longitudinal_plan: LongitudinalPlan,
    lateral_plan: LateralPlan,
    gps_location: GpsLocation,
    live_location: LiveLocation,
    settings: Option<HudSettings>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new tick: clear update flags and set the current frame
    pub fn begin_tick(&mut self, frame: u64) {
        self.frame = frame;
        self.updated = [false; Topic::COUNT];
    }

    /// Store `message` as the current value of its topic
    pub fn ingest(&mut self, message: TelemetryMessage, frame: u64) {
        let topic = message.topic();
        match message {
            TelemetryMessage::ModelV2(m) => self.model = m,
            TelemetryMessage::CarState(m) => self.car_state = m,
            TelemetryMessage::ControlsState(m) => self.controls_state = m,
            TelemetryMessage::LiveCalibration(m) => self.live_calibration = m,
            TelemetryMessage::DeviceState(m) => self.device_state = m,
            TelemetryMessage::PandaState(m) => self.panda_state = m,
            TelemetryMessage::RadarState(m) => self.radar_state = m,
            TelemetryMessage::LongitudinalPlan(m) => self.longitudinal_plan = m,
            TelemetryMessage::LateralPlan(m) => self.lateral_plan = m,
            TelemetryMessage::GpsLocation(m) => self.gps_location = m,
            TelemetryMessage::LiveLocation(m) => self.live_location = m,
            TelemetryMessage::Settings(m) => self.settings = Some(m),
        }
        self.updated[topic.index()] = true;
        self.last_frame[topic.index()] = Some(frame);
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Whether `topic` was ingested during the current tick
    pub fn updated(&self, topic: Topic) -> bool {
        self.updated[topic.index()]
    }

    /// Whether `topic` has ever been received
    pub fn received(&self, topic: Topic) -> bool {
        self.last_frame[topic.index()].is_some()
    }

    pub fn last_frame(&self, topic: Topic) -> Option<u64> {
        self.last_frame[topic.index()]
    }

    /// A topic is stale when it was never received, or when more than
    /// `timeout_ticks` frames have passed since it was
    pub fn is_stale(&self, topic: Topic, timeout_ticks: u64) -> bool {
        match self.last_frame[topic.index()] {
            Some(frame) => self.frame.saturating_sub(frame) > timeout_ticks,
            None => true,
        }
    }

    pub fn model(&self) -> &ModelGeometry {
        &self.model
    }

    pub fn car_state(&self) -> &CarState {
        &self.car_state
    }

    pub fn controls_state(&self) -> &ControlsState {
        &self.controls_state
    }

    pub fn live_calibration(&self) -> &LiveCalibration {
        &self.live_calibration
    }

    pub fn device_state(&self) -> &DeviceState {
        &self.device_state
    }

    pub fn panda_state(&self) -> &PandaState {
        &self.panda_state
    }

    pub fn radar_state(&self) -> &RadarState {
        &self.radar_state
    }

    pub fn longitudinal_plan(&self) -> &LongitudinalPlan {
        &self.longitudinal_plan
    }

    pub fn lateral_plan(&self) -> &LateralPlan {
        &self.lateral_plan
    }

    pub fn gps_location(&self) -> &GpsLocation {
        &self.gps_location
    }

    pub fn live_location(&self) -> &LiveLocation {
        &self.live_location
    }

    /// Settings pushed through the telemetry stream, if any
    pub fn settings(&self) -> Option<&HudSettings> {
        self.settings.as_ref()
    }
}
