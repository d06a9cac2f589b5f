//! Calibration and projection of model geometry into screen space
//!
//! Points in the calibrated car frame (X forward, Y right, Z down) go through
//! the live calibration rotation into the camera view frame, through the road
//! camera intrinsics onto the image plane, and finally through the device
//! transform (centre, zoom, vertical offset) into framebuffer pixels.

use crate::config::{DrawConfig, EngineConfig};
use crate::error::{EngineError, Result};
use hud_core::model::{LeadPrediction, ModelGeometry, Trajectory, TRAJECTORY_SIZE};
use nalgebra::{Matrix3, Rotation3, Vector3};
use serde::Serialize;

/// Capacity of a ribbon: one forward and one backward vertex per sample
pub const MAX_LINE_VERTICES: usize = 2 * TRAJECTORY_SIZE;

const ORTHONORMAL_TOLERANCE: f32 = 1e-3;

/// Maps device axes (forward, right, down) to view axes (right, down, forward)
fn view_from_device() -> Matrix3<f32> {
    Matrix3::new(
        0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0, //
        1.0, 0.0, 0.0,
    )
}

// === Calibration ===

/// View-from-calibration rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    view_from_calib: Matrix3<f32>,
}

impl Default for Calibration {
    /// Device assumed perfectly aligned with the car
    fn default() -> Self {
        Self {
            view_from_calib: view_from_device(),
        }
    }
}

impl Calibration {
    /// Build the calibration from roll, pitch, yaw (radians)
    pub fn from_rpy(rpy: [f32; 3]) -> Result<Self> {
        if !rpy.iter().all(|a| a.is_finite()) {
            return Err(EngineError::DegenerateCalibration(format!(
                "non-finite angles {:?}",
                rpy
            )));
        }
        let [roll, pitch, yaw] = rpy;
        let device_from_calib = Rotation3::from_euler_angles(roll, pitch, yaw).into_inner();
        let view_from_calib = view_from_device() * device_from_calib;

        let error = (view_from_calib.transpose() * view_from_calib - Matrix3::identity()).norm();
        if !(error <= ORTHONORMAL_TOLERANCE) {
            return Err(EngineError::DegenerateCalibration(format!(
                "rotation not orthonormal (error {})",
                error
            )));
        }

        Ok(Self { view_from_calib })
    }

    pub fn matrix(&self) -> &Matrix3<f32> {
        &self.view_from_calib
    }
}

// === Projection ===

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub x: f32,
    pub y: f32,
    pub visible: bool,
}

#[derive(Debug, Clone)]
pub struct Projector {
    calibration: Calibration,
    intrinsics: Matrix3<f32>,
    cx: f32,
    cy: f32,
    zoom: f32,
    fb_width: f32,
    fb_height: f32,
    y_offset: f32,
    clip_margin: f32,
}

impl Projector {
    pub fn new(config: &EngineConfig) -> Self {
        let cam = &config.camera;
        let display = &config.display;
        Self {
            calibration: Calibration::default(),
            intrinsics: Matrix3::new(
                cam.fx, 0.0, cam.cx, //
                0.0, cam.fy, cam.cy, //
                0.0, 0.0, 1.0,
            ),
            cx: cam.cx,
            cy: cam.cy,
            zoom: display.zoom_reference / cam.fx,
            fb_width: display.framebuffer_width as f32,
            fb_height: display.framebuffer_height as f32,
            y_offset: display.y_offset,
            clip_margin: display.clip_margin,
        }
    }

    pub fn set_calibration(&mut self, calibration: Calibration) {
        self.calibration = calibration;
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Project a point in the calibrated car frame to framebuffer pixels
    pub fn project(&self, point: Vector3<f32>) -> Projected {
        let ep = self.calibration.matrix() * point;
        let kep = self.intrinsics * ep;

        if !(kep.z > 0.0) {
            return Projected {
                x: 0.0,
                y: 0.0,
                visible: false,
            };
        }

        let px = kep.x / kep.z;
        let py = kep.y / kep.z;
        let x = self.fb_width / 2.0 + self.zoom * (px - self.cx);
        let y = self.fb_height / 2.0 + self.y_offset + self.zoom * (py - self.cy);

        let margin = self.clip_margin;
        let visible = x.is_finite()
            && y.is_finite()
            && x >= -margin
            && x <= self.fb_width + margin
            && y >= -margin
            && y <= self.fb_height + margin;

        Projected { x, y, visible }
    }

    pub fn project_xyz(&self, x: f32, y: f32, z: f32) -> Projected {
        self.project(Vector3::new(x, y, z))
    }

    /// Build a closed ribbon around `line` up to and including `max_idx`:
    /// forward along the left edge, back along the right edge. Vertices that
    /// project off screen are skipped.
    ///
    /// # Panics
    ///
    /// If `line` is longer than [`TRAJECTORY_SIZE`], its components differ in
    /// length, or `max_idx` is past its end.
    pub fn build_ribbon(
        &self,
        line: &Trajectory,
        half_width: f32,
        z_offset: f32,
        max_idx: usize,
    ) -> LineVertices {
        assert!(line.x.len() <= TRAJECTORY_SIZE, "trajectory longer than model");
        assert!(
            line.x.len() == line.y.len() && line.x.len() == line.z.len(),
            "trajectory components differ in length"
        );
        assert!(max_idx < line.x.len(), "max_idx past end of trajectory");

        let mut out = LineVertices::default();
        for i in 0..=max_idx {
            let p = self.project_xyz(line.x[i], line.y[i] - half_width, line.z[i] + z_offset);
            if p.visible {
                out.push(p.x, p.y);
            }
        }
        for i in (0..=max_idx).rev() {
            let p = self.project_xyz(line.x[i], line.y[i] + half_width, line.z[i] + z_offset);
            if p.visible {
                out.push(p.x, p.y);
            }
        }
        out
    }

    /// Chevron markers for the model's lead predictions
    pub fn lead_markers(&self, model: &ModelGeometry, draw: &DrawConfig) -> Vec<LeadMarker> {
        let mut markers = Vec::with_capacity(2);
        let [first, second] = &model.leads;

        let first_shown = first.prob > draw.lead_prob_threshold;
        if first_shown {
            markers.extend(self.lead_marker(first, &model.position, draw));
        }
        if second.prob > draw.lead_prob_threshold && (second.x - first.x).abs() > 3.0 {
            markers.extend(self.lead_marker(second, &model.position, draw));
        }
        markers
    }

    fn lead_marker(
        &self,
        lead: &LeadPrediction,
        path: &Trajectory,
        draw: &DrawConfig,
    ) -> Option<LeadMarker> {
        let path_z = if is_well_formed(path) {
            path.z[path_length_index(path, lead.x)]
        } else {
            0.0
        };
        let anchor = self.project_xyz(lead.x, lead.y, path_z + draw.path_z_offset);
        if !anchor.visible {
            return None;
        }

        let d_rel = lead.x;
        let v_rel = lead.v;
        let mut fill_alpha = 0.0;
        if d_rel < 40.0 {
            fill_alpha = 255.0 * (1.0 - d_rel / 40.0);
            if v_rel < 0.0 {
                fill_alpha += 255.0 * (-v_rel / 10.0);
            }
            fill_alpha = fill_alpha.min(255.0);
        }

        let size = (750.0 / (d_rel / 3.0 + 30.0)).clamp(15.0, 30.0) * 2.35;
        let x = anchor.x.clamp(0.0, self.fb_width - size / 2.0);
        let y = anchor.y.min(self.fb_height - size * 0.6);

        Some(LeadMarker {
            x,
            y,
            size,
            fill_alpha: fill_alpha.max(0.0) as u8,
            distance: d_rel,
            rel_speed: v_rel,
        })
    }

    /// Project all model geometry for one tick
    pub fn project_model(&self, model: &ModelGeometry, draw: &DrawConfig) -> SceneGeometry {
        let distances = draw_distances(model, draw);
        let ribbon = |line: &Trajectory, half_width: f32, z_offset: f32, distance: f32| {
            if is_well_formed(line) {
                self.build_ribbon(line, half_width, z_offset, path_length_index(line, distance))
            } else {
                LineVertices::default()
            }
        };

        let lane_lines = std::array::from_fn(|i| {
            ribbon(
                &model.lane_lines[i],
                draw.lane_line_width_scale * model.lane_line_probs[i],
                0.0,
                distances.lane_lines,
            )
        });
        let road_edges = std::array::from_fn(|i| {
            ribbon(&model.road_edges[i], draw.road_edge_half_width, 0.0, distances.road_edges)
        });
        let track = ribbon(
            &model.position,
            draw.path_half_width,
            draw.path_z_offset,
            distances.path,
        );

        SceneGeometry {
            lane_lines,
            road_edges,
            track,
            leads: self.lead_markers(model, draw),
            distances,
        }
    }
}

/// Whether a telemetry trajectory can be fed to [`Projector::build_ribbon`]
pub fn is_well_formed(line: &Trajectory) -> bool {
    !line.x.is_empty()
        && line.x.len() <= TRAJECTORY_SIZE
        && line.x.len() == line.y.len()
        && line.x.len() == line.z.len()
}

/// Last index of the leading run of samples closer than `distance`
pub fn path_length_index(line: &Trajectory, distance: f32) -> usize {
    line.x
        .iter()
        .take(TRAJECTORY_SIZE)
        .take_while(|x| **x < distance)
        .count()
        .saturating_sub(1)
}

// === Ribbons ===

/// Ordered screen-space vertices of one closed ribbon
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LineVertices {
    points: Vec<ScreenPoint>,
}

impl LineVertices {
    pub fn push(&mut self, x: f32, y: f32) {
        assert!(
            self.points.len() < MAX_LINE_VERTICES,
            "ribbon vertex buffer overflow"
        );
        self.points.push(ScreenPoint { x, y });
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[ScreenPoint] {
        &self.points
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DrawDistances {
    pub lane_lines: f32,
    pub road_edges: f32,
    pub path: f32,
}

/// How far ahead each kind of line is drawn
pub fn draw_distances(model: &ModelGeometry, draw: &DrawConfig) -> DrawDistances {
    let furthest = model.position.x.last().copied().unwrap_or(0.0);
    let max = if furthest.is_finite() {
        furthest.clamp(draw.min_draw_distance, draw.max_draw_distance)
    } else {
        draw.min_draw_distance
    };

    let mut path = max;
    let lead = &model.leads[0];
    if lead.prob > draw.lead_prob_threshold && lead.x.is_finite() {
        let gap = lead.x * draw.lead_gap_scale;
        let truncated = gap - (gap * draw.lead_gap_fraction).min(draw.lead_gap_cap);
        path = truncated.clamp(draw.min_lead_draw_distance, max);
    }

    DrawDistances {
        lane_lines: max,
        road_edges: max,
        path,
    }
}

// === Leads ===

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LeadMarker {
    /// Chevron tip, framebuffer pixels
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub fill_alpha: u8,
    pub distance: f32,
    pub rel_speed: f32,
}

/// Screen-space geometry for one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneGeometry {
    pub lane_lines: [LineVertices; 4],
    pub road_edges: [LineVertices; 2],
    pub track: LineVertices,
    pub leads: Vec<LeadMarker>,
    pub distances: DrawDistances,
}
