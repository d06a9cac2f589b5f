//! Demo source that generates synthetic on-road telemetry for testing
//!
//! Simulates a loop of road segments with cruising, a slowing lead vehicle,
//! curves and acceleration phases. Time advances by a fixed step per poll so
//! the generated drive is fully deterministic.

use anyhow::Result;
use hud_core::{model::*, source::TelemetrySource, units::*};

// =============================================================================
// Route definition: a sequence of segments that form a loop
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SegmentKind {
    Cruise,  // Steady speed, no lead
    Follow,  // Lead vehicle ahead at a comfortable gap
    Braking, // Lead slows down, friction braking
    Curve,   // Constant speed through a bend
    Accel,   // Accelerating back to cruise
}

#[derive(Clone, Copy)]
struct RouteSegment {
    kind: SegmentKind,
    duration: f32,     // seconds
    target_speed: f32, // m/s at end of segment
    curvature: f32,    // 1/m, signed: + = right
    slope: f32,        // rise over run
}

/// A short commute: ~70s loop
fn demo_route() -> Vec<RouteSegment> {
    vec![
        RouteSegment { kind: SegmentKind::Cruise,  duration: 10.0, target_speed: 27.0, curvature: 0.0,     slope: 0.0 },
        RouteSegment { kind: SegmentKind::Follow,  duration: 8.0,  target_speed: 25.0, curvature: 0.0,     slope: 0.02 },
        RouteSegment { kind: SegmentKind::Braking, duration: 5.0,  target_speed: 9.0,  curvature: 0.0,     slope: 0.02 },
        RouteSegment { kind: SegmentKind::Accel,   duration: 7.0,  target_speed: 22.0, curvature: 0.0,     slope: 0.0 },
        RouteSegment { kind: SegmentKind::Curve,   duration: 9.0,  target_speed: 20.0, curvature: 0.004,   slope: -0.03 },
        RouteSegment { kind: SegmentKind::Cruise,  duration: 8.0,  target_speed: 26.0, curvature: 0.0,     slope: 0.0 },
        RouteSegment { kind: SegmentKind::Curve,   duration: 8.0,  target_speed: 18.0, curvature: -0.006,  slope: 0.04 },
        RouteSegment { kind: SegmentKind::Follow,  duration: 9.0,  target_speed: 21.0, curvature: -0.001,  slope: 0.0 },
        RouteSegment { kind: SegmentKind::Accel,   duration: 6.0,  target_speed: 27.0, curvature: 0.0,     slope: 0.0 },
    ]
}

// =============================================================================
// Drive state derived from route position
// =============================================================================

struct DriveState {
    kind: SegmentKind,
    speed: f32,
    accel: f32,
    curvature: f32,
    slope: f32,
    brake_percent: i32,
    lead_gap: Option<f32>,
    lead_rel_speed: f32,
}

fn compute_drive_state(route: &[RouteSegment], time: f32) -> DriveState {
    let loop_duration: f32 = route.iter().map(|s| s.duration).sum();
    let t = time % loop_duration;

    let mut elapsed = 0.0_f32;
    let mut seg_idx = route.len() - 1;
    for (i, seg) in route.iter().enumerate() {
        if elapsed + seg.duration > t {
            seg_idx = i;
            break;
        }
        elapsed += seg.duration;
    }

    let seg = route[seg_idx];
    let seg_t = ((t - elapsed) / seg.duration).clamp(0.0, 1.0);
    let prev = route[(seg_idx + route.len() - 1) % route.len()];

    let smooth_t = smoothstep(seg_t);
    let speed = lerp(prev.target_speed, seg.target_speed, smooth_t);
    let accel = (seg.target_speed - prev.target_speed) / seg.duration;
    let curvature = lerp(prev.curvature, seg.curvature, smooth_t);

    let (brake_percent, lead_gap, lead_rel_speed) = match seg.kind {
        SegmentKind::Cruise => (0, None, 0.0),
        SegmentKind::Follow => (0, Some(35.0 + 5.0 * (seg_t * 6.0).sin()), 0.0),
        SegmentKind::Braking => {
            // Gap closes from 35 m to 6 m, friction braking throughout
            let gap = lerp(35.0, 6.0, smooth_t);
            (60 + (30.0 * (1.0 - seg_t)) as i32, Some(gap), -4.0 * (1.0 - seg_t))
        }
        SegmentKind::Curve => (if seg.target_speed < prev.target_speed { 20 } else { 0 }, None, 0.0),
        SegmentKind::Accel => (0, None, 0.0),
    };

    DriveState {
        kind: seg.kind,
        speed,
        accel,
        curvature,
        slope: seg.slope,
        brake_percent,
        lead_gap,
        lead_rel_speed,
    }
}

fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Simple deterministic noise from a seed
fn noise(seed: f32) -> f32 {
    let x = (seed * 12.9898 + 78.233).sin() * 43_758.547;
    x - x.floor()
}

/// Small jitter centered around 0
fn jitter(seed: f32, amplitude: f32) -> f32 {
    (noise(seed) - 0.5) * 2.0 * amplitude
}

/// Lateral offset of a constant-curvature arc at distance `x`
fn arc_offset(curvature: f32, x: f32) -> f32 {
    0.5 * curvature * x * x
}

// =============================================================================
// DemoSource
// =============================================================================

/// Polls between two calibration messages
const CALIBRATION_EVERY: u64 = 100;
const DEVICE_EVERY: u64 = 10;
const GPS_EVERY: u64 = 20;
const PLAN_EVERY: u64 = 2;

const LANE_WIDTH: f32 = 3.6;
const CAMERA_HEIGHT: f32 = 1.22;

pub struct DemoSource {
    active: bool,
    poll_count: u64,
    step: f32,
    route: Vec<RouteSegment>,
    odometer: f32,
    altitude: f32,
}

impl DemoSource {
    /// Create a demo drive advancing 1/20 s per poll
    pub fn new() -> Self {
        Self::with_step(0.05)
    }

    /// Create a demo drive advancing `step` seconds per poll
    pub fn with_step(step: f32) -> Self {
        Self {
            active: false,
            poll_count: 0,
            step,
            route: demo_route(),
            odometer: 0.0,
            altitude: 120.0,
        }
    }

    /// Simulated seconds since start
    pub fn sim_time(&self) -> f32 {
        self.poll_count as f32 * self.step
    }

    fn generate_batch(&mut self) -> Vec<TelemetryMessage> {
        let t = self.sim_time();
        self.poll_count += 1;
        let n = self.poll_count as f32; // noise seed
        let state = compute_drive_state(&self.route, t);

        let speed = (state.speed + jitter(n, 0.1)).max(0.0);
        let travelled = speed * self.step;
        self.odometer += travelled;
        self.altitude += travelled * state.slope;

        let mut batch = Vec::with_capacity(12);

        if self.poll_count == 1 || self.poll_count % CALIBRATION_EVERY == 0 {
            batch.push(TelemetryMessage::LiveCalibration(LiveCalibration {
                rpy_calib: [0.0, 0.02 + jitter(n * 0.7, 0.001), -0.01],
            }));
        }

        batch.push(TelemetryMessage::ModelV2(self.model(&state, n)));

        let steering_angle = (state.curvature * 2.7 * 15.0).to_degrees();
        batch.push(TelemetryMessage::CarState(CarState {
            v_ego: MetersPerSecond(speed),
            a_ego: MetersPerSecondSquared(state.accel + jitter(n * 1.1, 0.05)),
            steering_angle: Degrees(steering_angle + jitter(n * 1.2, 0.2)),
            steering_pressed: false,
            steering_torque_eps: NewtonMeters(state.curvature * 400.0 + jitter(n * 1.3, 0.1)),
            engine_rpm: Rpm(800.0 + speed * 70.0),
            engine_coolant_temp: Celsius(88.0 + jitter(n * 1.4, 0.3)),
            friction_brake_percent: state.brake_percent,
            pitch: Radians(state.slope.atan() + jitter(n * 1.5, 0.001)),
            one_pedal_active: false,
            coast_one_pedal_active: false,
            lk_mode: false,
            read_distance_lines: 2,
            hvb_voltage: Volts(370.0 - state.accel.max(0.0) * 4.0),
            hvb_current: Amperes(state.accel * 40.0 + jitter(n * 1.6, 1.0)),
            hvb_wattage: (370.0 - state.accel.max(0.0) * 4.0) * state.accel * 40.0 / 1000.0,
        }));

        batch.push(TelemetryMessage::ControlsState(ControlsState {
            enabled: true,
            engageable: true,
            alert_status: if state.kind == SegmentKind::Braking && state.lead_gap.unwrap_or(f32::MAX) < 10.0 {
                AlertStatus::UserPrompt
            } else {
                AlertStatus::Normal
            },
            alert_size: AlertSize::None,
            v_cruise: 100.0,
            steering_angle_desired: Degrees(steering_angle + jitter(n * 1.7, 0.5)),
        }));

        batch.push(TelemetryMessage::RadarState(RadarState {
            lead_one: match state.lead_gap {
                Some(gap) => RadarLead {
                    status: true,
                    d_rel: Meters(gap),
                    v_rel: MetersPerSecond(state.lead_rel_speed),
                    v_lead: MetersPerSecond(speed + state.lead_rel_speed),
                },
                None => RadarLead::default(),
            },
        }));

        if self.poll_count % PLAN_EVERY == 0 {
            batch.push(TelemetryMessage::LongitudinalPlan(LongitudinalPlan {
                desired_follow_distance: 1.45,
                lead_dist_cost: 3.0,
                lead_accel_cost: 0.5,
                stopping_distance: Meters(4.0),
                dynamic_follow_level: if state.lead_gap.is_some() { 1.0 } else { 2.0 },
                speed_limit: MetersPerSecond(if self.odometer % 2000.0 < 1000.0 { 25.0 } else { 0.0 }),
                is_map_speed_limit: true,
                vision_turn_state: if state.kind == SegmentKind::Curve {
                    VisionTurnState::Turning
                } else {
                    VisionTurnState::Disabled
                },
                vision_current_lat_accel: MetersPerSecondSquared(speed * speed * state.curvature),
                ..Default::default()
            }));
            batch.push(TelemetryMessage::LateralPlan(LateralPlan {
                lane_width: Meters(LANE_WIDTH),
                d_prob: 0.9,
                l_prob: 0.9,
                r_prob: 0.85,
                laneless_mode: false,
            }));
        }

        if self.poll_count % DEVICE_EVERY == 0 {
            batch.push(TelemetryMessage::DeviceState(DeviceState {
                started: true,
                cpu_temp_c: vec![55.0 + jitter(n * 2.0, 1.0), 56.0 + jitter(n * 2.1, 1.0)],
                cpu_usage_percent: vec![35, 42, 28, 31],
                memory_temp_c: Celsius(48.0),
                ambient_temp_c: Celsius(31.0),
                thermal_status: ThermalStatus::Green,
                fan_speed_percent: 30,
                memory_usage_percent: 54,
                free_space_percent: 71.5,
            }));
            batch.push(TelemetryMessage::PandaState(PandaState {
                panda_type: PandaType::Dos,
                ignition_line: true,
                ignition_can: false,
            }));
            batch.push(TelemetryMessage::LiveLocation(LiveLocation {
                gps_ok: true,
                lat_accel: MetersPerSecondSquared(speed * speed * state.curvature),
            }));
        }

        if self.poll_count % GPS_EVERY == 0 {
            batch.push(TelemetryMessage::GpsLocation(GpsLocation {
                accuracy: Meters(2.5 + jitter(n * 3.0, 0.5)),
                altitude: Meters(self.altitude),
                satellite_count: 11,
            }));
        }

        batch
    }

    fn model(&self, state: &DriveState, n: f32) -> ModelGeometry {
        let k = state.curvature;
        let lane = |offset: f32| Trajectory::along(|x| (arc_offset(k, x) + offset, CAMERA_HEIGHT));
        let lead = match state.lead_gap {
            Some(gap) => LeadPrediction {
                prob: 0.95,
                x: gap + jitter(n * 4.0, 0.2),
                y: arc_offset(k, gap),
                v: state.lead_rel_speed,
            },
            None => LeadPrediction::default(),
        };

        ModelGeometry {
            position: Trajectory::along(|x| (arc_offset(k, x), 0.0)),
            lane_lines: [
                lane(-1.5 * LANE_WIDTH),
                lane(-0.5 * LANE_WIDTH),
                lane(0.5 * LANE_WIDTH),
                lane(1.5 * LANE_WIDTH),
            ],
            lane_line_probs: [0.3, 0.92, 0.9, 0.25],
            road_edges: [lane(-1.6 * LANE_WIDTH), lane(1.6 * LANE_WIDTH)],
            road_edge_stds: [0.4, 0.5],
            leads: [lead, LeadPrediction::default()],
        }
    }
}

impl Default for DemoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySource for DemoSource {
    fn key(&self) -> &str {
        "demo"
    }

    fn name(&self) -> &str {
        "Demo Drive"
    }

    fn start(&mut self) -> Result<()> {
        self.active = true;
        self.poll_count = 0;
        self.odometer = 0.0;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.active = false;
        Ok(())
    }

    fn poll(&mut self) -> Result<Vec<TelemetryMessage>> {
        if !self.active {
            return Ok(Vec::new());
        }

        Ok(self.generate_batch())
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_braking_segment_uses_friction_brake() {
        let route = demo_route();
        // 10s cruise + 8s follow + 1s into braking
        let state = compute_drive_state(&route, 19.0);
        assert_eq!(state.kind, SegmentKind::Braking);
        assert!(state.brake_percent > 50);
        assert!(state.lead_gap.is_some());
        assert!(state.lead_rel_speed < 0.0);
    }

    #[test]
    fn test_route_loops() {
        let route = demo_route();
        let loop_duration: f32 = route.iter().map(|s| s.duration).sum();
        let a = compute_drive_state(&route, 3.0);
        let b = compute_drive_state(&route, 3.0 + loop_duration);
        assert!((a.speed - b.speed).abs() < 1e-3);
    }

    #[test]
    fn test_arc_offset() {
        assert_eq!(arc_offset(0.0, 50.0), 0.0);
        assert!((arc_offset(0.004, 100.0) - 20.0).abs() < 1e-4);
    }
}
