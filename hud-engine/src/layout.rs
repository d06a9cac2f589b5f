//! Adaptive layout and hit regions
//!
//! Optional indicators first claim a slot in one of the screen clusters;
//! the claimed list is then resolved into rectangles. Each present
//! indicator in the bottom-right cluster pushes the next one inward, and
//! alerts push the bottom row upward.

use hud_core::model::{AlertSize, DimTier, MAX_MEASURE_SLOTS};
use serde::Serialize;

pub const BORDER: i32 = 30;
pub const FOOTER_HEIGHT: i32 = 280;
pub const BRAKE_RADIUS: i32 = 90;
pub const WHEEL_RADIUS: i32 = 88;
pub const FACE_RADIUS: i32 = 96;
pub const BUTTON_RADIUS: i32 = 72;
pub const BUTTON_TOUCH_PAD: i32 = 80;
pub const SPEED_SIGN_RADIUS: i32 = 96;
pub const SPEED_SIGN_TOUCH_PAD: i32 = 60;
pub const MAX_SPEED_RECT: Rect = Rect {
    x: BORDER * 2,
    y: BORDER * 3 / 2,
    w: 184,
    h: 202,
};

// === Rect ===

/// Axis-aligned integer rectangle in framebuffer pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    /// Marks an indicator that cannot be hit
    pub const NONE: Rect = Rect {
        x: 1,
        y: 1,
        w: 1,
        h: 1,
    };

    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Square bounding a circle
    pub const fn around(cx: i32, cy: i32, r: i32) -> Self {
        Self::new(cx - r, cy - r, 2 * r, 2 * r)
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn center_x(&self) -> i32 {
        self.x + self.w / 2
    }

    pub fn center_y(&self) -> i32 {
        self.y + self.h / 2
    }

    pub fn is_degenerate(&self) -> bool {
        self.w <= 1 || self.h <= 1
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }
}

impl Default for Rect {
    fn default() -> Self {
        Rect::NONE
    }
}

// === Indicators and slots ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    MaxSpeed,
    OnePedal,
    SpeedLimitSign,
    SteeringWheel,
    DriverFace,
    ScreenDim,
    LanelessButton,
    Brake,
    AccelModeButton,
    FollowModeButton,
    Measure(u8),
}

/// Every indicator except the measure slots, in hit-region order
pub const FIXED_INDICATORS: [Indicator; 10] = [
    Indicator::MaxSpeed,
    Indicator::OnePedal,
    Indicator::SpeedLimitSign,
    Indicator::SteeringWheel,
    Indicator::DriverFace,
    Indicator::ScreenDim,
    Indicator::LanelessButton,
    Indicator::Brake,
    Indicator::AccelModeButton,
    Indicator::FollowModeButton,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cluster {
    TopLeft,
    TopRight,
    BottomRight,
    MeasureGrid,
    BottomLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClaimedSlot {
    pub cluster: Cluster,
    pub indicator: Indicator,
}

/// Everything the layout depends on for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutInputs {
    pub fb_width: i32,
    pub fb_height: i32,
    pub started: bool,
    pub alert_size: AlertSize,
    pub engageable: bool,
    /// Turn-speed box replaces the steering wheel
    pub vision_turn_box: bool,
    pub one_pedal_fade: f32,
    pub speed_limit_known: bool,
    pub brake_percent: i32,
    pub accel_mode_button: bool,
    pub follow_mode_button: bool,
    pub end_to_end: bool,
    pub screen_dim_mode: DimTier,
    pub measure_slots: usize,
}

impl Default for LayoutInputs {
    fn default() -> Self {
        Self {
            fb_width: 1920,
            fb_height: 1080,
            started: false,
            alert_size: AlertSize::None,
            engageable: false,
            vision_turn_box: false,
            one_pedal_fade: -1.0,
            speed_limit_known: false,
            brake_percent: -1,
            accel_mode_button: false,
            follow_mode_button: false,
            end_to_end: false,
            screen_dim_mode: DimTier::Bright,
            measure_slots: 0,
        }
    }
}

/// Decide which optional indicators are shown, cluster by cluster
pub fn claim_slots(inputs: &LayoutInputs) -> Vec<ClaimedSlot> {
    use Cluster::*;
    let mut claimed = Vec::new();
    let mut claim = |cluster, indicator| claimed.push(ClaimedSlot { cluster, indicator });

    if inputs.one_pedal_fade > 0.0 {
        claim(TopLeft, Indicator::OnePedal);
    } else {
        claim(TopLeft, Indicator::MaxSpeed);
    }
    if inputs.speed_limit_known && inputs.engageable {
        claim(TopLeft, Indicator::SpeedLimitSign);
    }

    if inputs.engageable && !inputs.vision_turn_box {
        claim(TopRight, Indicator::SteeringWheel);
    }

    let bottom_row = inputs.alert_size != AlertSize::Full;
    if bottom_row && inputs.brake_percent >= 0 {
        claim(BottomRight, Indicator::Brake);
    }
    if inputs.accel_mode_button {
        claim(BottomRight, Indicator::AccelModeButton);
    }
    if inputs.follow_mode_button {
        claim(BottomRight, Indicator::FollowModeButton);
    }

    if matches!(inputs.alert_size, AlertSize::None | AlertSize::Small) {
        let slots = inputs.measure_slots.min(MAX_MEASURE_SLOTS);
        for i in 0..slots {
            claim(MeasureGrid, Indicator::Measure(i as u8));
        }
    }

    if bottom_row {
        claim(BottomLeft, Indicator::DriverFace);
    }
    if inputs.end_to_end {
        claim(BottomLeft, Indicator::LanelessButton);
    }
    if inputs.started {
        claim(BottomLeft, Indicator::ScreenDim);
    }

    claimed
}

// === Layout ===

/// Drawn bounds and touch region of one indicator
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub indicator: Indicator,
    pub bounds: Rect,
    pub touch: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HitRegion {
    pub indicator: Indicator,
    pub rect: Rect,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    pub claimed: Vec<ClaimedSlot>,
    pub placements: Vec<Placement>,
    pub measure_grid: Rect,
}

impl Layout {
    pub fn placement(&self, indicator: Indicator) -> Option<&Placement> {
        self.placements.iter().find(|p| p.indicator == indicator)
    }

    /// Touch rectangle of `indicator`, or [`Rect::NONE`] when not shown
    pub fn rect(&self, indicator: Indicator) -> Rect {
        self.placement(indicator)
            .map(|p| p.touch)
            .unwrap_or(Rect::NONE)
    }

    /// One region per interactive indicator, measure slots included.
    /// Hidden indicators carry [`Rect::NONE`].
    pub fn hit_regions(&self) -> Vec<HitRegion> {
        let measures = (0..MAX_MEASURE_SLOTS).map(|i| Indicator::Measure(i as u8));
        FIXED_INDICATORS
            .iter()
            .copied()
            .chain(measures)
            .map(|indicator| HitRegion {
                indicator,
                rect: self.rect(indicator),
            })
            .collect()
    }

    /// First indicator whose touch region contains the point
    pub fn hit_test(&self, x: i32, y: i32) -> Option<Indicator> {
        self.placements
            .iter()
            .filter(|p| !p.touch.is_degenerate())
            .find(|p| p.touch.contains(x, y))
            .map(|p| p.indicator)
    }
}

fn offset_button_y(alert: AlertSize, center_y: i32, radius: i32) -> i32 {
    match alert {
        AlertSize::Small => 2 * center_y / 3 + radius / 2,
        AlertSize::Mid => (center_y + radius) / 2,
        _ => center_y,
    }
}

/// Geometry of the measure grid for `n` slots
struct MeasureGrid {
    rect: Rect,
    slot_radius: i32,
    slot_height: i32,
}

fn measure_grid(fb_width: i32, fb_height: i32, n: i32) -> MeasureGrid {
    let max_slots = MAX_MEASURE_SLOTS as i32;
    let mut center_x = fb_width - WHEEL_RADIUS - BORDER * 2;
    let brake_y = fb_height - FOOTER_HEIGHT / 2;
    let y_min = MAX_SPEED_RECT.bottom() + BORDER / 2;
    let y_max = brake_y - BRAKE_RADIUS - BORDER / 2;
    let y_rng = y_max - y_min;

    // Up to four slots share one tall column; more use fixed-height rows in two columns
    let slot_height = if n <= 4 {
        y_rng / n.max(3)
    } else {
        y_rng / max_slots * 2
    };
    let slot_height_ref = (y_rng / max_slots * 2).max(1);
    let ratio = slot_height as f32 / slot_height_ref as f32;
    let y_mid = (y_max + y_min) / 2;
    let grid_h = slot_height * n.min(5);
    let grid_y = y_mid - grid_h / 2;

    let (slot_radius, grid_x, grid_w) = if n <= 4 {
        let r_ref = BRAKE_RADIUS + 12;
        let r = (BRAKE_RADIUS as f32 * ratio + 12.0) as i32;
        center_x -= r - r_ref;
        (r, center_x - r, 2 * r)
    } else if n <= 5 {
        let r = BRAKE_RADIUS + 12;
        (r, center_x - r, 2 * r)
    } else {
        let r = BRAKE_RADIUS + 6;
        (r, center_x - 3 * r, 4 * r)
    };

    MeasureGrid {
        rect: Rect::new(grid_x, grid_y, grid_w, grid_h),
        slot_radius,
        slot_height,
    }
}

/// Resolve the claimed slots into rectangles
pub fn compute_layout(inputs: &LayoutInputs) -> Layout {
    let claimed = claim_slots(inputs);
    let has = |ind: Indicator| claimed.iter().any(|c| c.indicator == ind);
    let alert = inputs.alert_size;
    let fb_w = inputs.fb_width;
    let fb_h = inputs.fb_height;

    let n_measures = claimed
        .iter()
        .filter(|c| c.cluster == Cluster::MeasureGrid)
        .count() as i32;
    let grid = if n_measures > 0 {
        Some(measure_grid(fb_w, fb_h, n_measures))
    } else {
        None
    };

    // Small alerts with a measure grid move the right-side buttons to its left
    let mirror_x = |center_x: i32| -> i32 {
        match (&grid, alert) {
            (Some(g), AlertSize::Small) => {
                let off = g.rect.right() - center_x;
                g.rect.x - off - BORDER
            }
            _ => center_x,
        }
    };

    let button = |indicator: Indicator, cx: i32, cy: i32| {
        let r = BUTTON_RADIUS;
        Placement {
            indicator,
            bounds: Rect::new(cx - r / 2, cy - r / 2, 2 * r, 2 * r),
            touch: Rect::new(
                cx - BUTTON_TOUCH_PAD,
                cy - BUTTON_TOUCH_PAD,
                r + 2 * BUTTON_TOUCH_PAD,
                r + 2 * BUTTON_TOUCH_PAD,
            ),
        }
    };

    let right_x = fb_w - WHEEL_RADIUS - BORDER * 2;
    let footer_mid = fb_h - FOOTER_HEIGHT / 2;
    let button_y = offset_button_y(alert, footer_mid - BUTTON_RADIUS / 2, BUTTON_RADIUS);
    let max_speed = MAX_SPEED_RECT;

    let mut placements = Vec::with_capacity(claimed.len());
    let mut inward = 0;
    for slot in &claimed {
        let placement = match slot.indicator {
            Indicator::MaxSpeed => Placement {
                indicator: Indicator::MaxSpeed,
                bounds: max_speed,
                touch: max_speed,
            },
            Indicator::OnePedal => {
                let r = Rect::around(max_speed.center_x(), max_speed.center_y(), BRAKE_RADIUS);
                Placement {
                    indicator: Indicator::OnePedal,
                    bounds: r,
                    touch: r,
                }
            }
            Indicator::SpeedLimitSign => {
                let sign = Rect::new(
                    max_speed.center_x() - SPEED_SIGN_RADIUS,
                    max_speed.bottom() + BORDER,
                    2 * SPEED_SIGN_RADIUS,
                    2 * SPEED_SIGN_RADIUS,
                );
                let pad = SPEED_SIGN_TOUCH_PAD;
                Placement {
                    indicator: Indicator::SpeedLimitSign,
                    bounds: sign,
                    touch: Rect::new(sign.x - pad, sign.y - pad, sign.w + 2 * pad, sign.h + 2 * pad),
                }
            }
            Indicator::SteeringWheel => {
                let r = Rect::around(right_x, WHEEL_RADIUS + BORDER * 3 / 2, WHEEL_RADIUS);
                Placement {
                    indicator: Indicator::SteeringWheel,
                    bounds: r,
                    touch: r,
                }
            }
            Indicator::Brake => {
                let cx = mirror_x(right_x);
                let cy = offset_button_y(alert, footer_mid, BRAKE_RADIUS);
                let r = Rect::around(cx, cy, BRAKE_RADIUS);
                inward += BRAKE_RADIUS + 3 * BORDER + BUTTON_RADIUS;
                Placement {
                    indicator: Indicator::Brake,
                    bounds: r,
                    touch: r,
                }
            }
            Indicator::AccelModeButton => {
                let cx = mirror_x(right_x - inward);
                inward += 2 * (BORDER + BUTTON_RADIUS);
                button(Indicator::AccelModeButton, cx, button_y)
            }
            Indicator::FollowModeButton => {
                let cx = mirror_x(right_x - inward);
                inward += 2 * (BORDER + BUTTON_RADIUS);
                button(Indicator::FollowModeButton, cx, button_y)
            }
            Indicator::Measure(i) => {
                // Present whenever a measure slot is claimed
                let Some(g) = &grid else { continue };
                let i = i as i32;
                let col_x = if n_measures <= 5 {
                    0
                } else if i < 5 {
                    2 * g.slot_radius
                } else {
                    0
                };
                let r = Rect::new(
                    g.rect.x + col_x,
                    g.rect.y + (i % 5) * g.slot_height,
                    2 * g.slot_radius,
                    g.slot_height,
                );
                Placement {
                    indicator: slot.indicator,
                    bounds: r,
                    touch: r,
                }
            }
            Indicator::DriverFace => {
                let cy = offset_button_y(alert, footer_mid, FACE_RADIUS);
                Placement {
                    indicator: Indicator::DriverFace,
                    bounds: Rect::around(max_speed.center_x(), cy, FACE_RADIUS),
                    touch: Rect::NONE,
                }
            }
            Indicator::LanelessButton => {
                let cx = max_speed.center_x() + FACE_RADIUS + BORDER + BUTTON_RADIUS;
                button(Indicator::LanelessButton, cx, button_y)
            }
            Indicator::ScreenDim => {
                // Grows as the selected tier gets dimmer
                let k = 1 + DimTier::BRIGHTEST.index() as i32 - inputs.screen_dim_mode.index() as i32;
                let r = Rect::around(max_speed.center_x(), footer_mid, k * FACE_RADIUS);
                Placement {
                    indicator: Indicator::ScreenDim,
                    bounds: r,
                    touch: r,
                }
            }
        };
        placements.push(placement);
    }

    Layout {
        measure_grid: grid.as_ref().map(|g| g.rect).unwrap_or(Rect::NONE),
        claimed,
        placements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driving() -> LayoutInputs {
        LayoutInputs {
            started: true,
            engageable: true,
            brake_percent: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_rect_none_is_degenerate() {
        assert!(Rect::NONE.is_degenerate());
        assert!(!MAX_SPEED_RECT.is_degenerate());
        assert_eq!(MAX_SPEED_RECT.center_x(), 152);
        assert_eq!(MAX_SPEED_RECT.bottom(), 247);
    }

    #[test]
    fn test_hidden_indicators_are_none() {
        let layout = compute_layout(&LayoutInputs::default());
        assert_eq!(layout.rect(Indicator::SteeringWheel), Rect::NONE);
        assert_eq!(layout.rect(Indicator::ScreenDim), Rect::NONE);
        assert_eq!(layout.rect(Indicator::Brake), Rect::NONE);
        assert_eq!(layout.rect(Indicator::OnePedal), Rect::NONE);
        assert_eq!(layout.rect(Indicator::MaxSpeed), MAX_SPEED_RECT);
        assert_eq!(layout.measure_grid, Rect::NONE);
    }

    #[test]
    fn test_hit_regions_cover_hidden_indicators() {
        let regions = compute_layout(&LayoutInputs::default()).hit_regions();
        assert_eq!(regions.len(), FIXED_INDICATORS.len() + MAX_MEASURE_SLOTS);

        let rect_of = |indicator| {
            regions
                .iter()
                .find(|r| r.indicator == indicator)
                .map(|r| r.rect)
        };
        assert_eq!(rect_of(Indicator::Brake), Some(Rect::NONE));
        assert_eq!(rect_of(Indicator::SteeringWheel), Some(Rect::NONE));
        assert_eq!(rect_of(Indicator::ScreenDim), Some(Rect::NONE));
        assert_eq!(rect_of(Indicator::Measure(0)), Some(Rect::NONE));
        assert_eq!(rect_of(Indicator::MaxSpeed), Some(MAX_SPEED_RECT));
    }

    #[test]
    fn test_one_pedal_replaces_max_speed() {
        let inputs = LayoutInputs {
            one_pedal_fade: 0.4,
            ..driving()
        };
        let layout = compute_layout(&inputs);
        assert_eq!(layout.rect(Indicator::MaxSpeed), Rect::NONE);
        assert_eq!(layout.rect(Indicator::OnePedal), Rect::new(62, 56, 180, 180));
    }

    #[test]
    fn test_wheel_rect() {
        let layout = compute_layout(&driving());
        assert_eq!(layout.rect(Indicator::SteeringWheel), Rect::new(1684, 45, 176, 176));
    }

    #[test]
    fn test_speed_sign_below_max_speed() {
        let inputs = LayoutInputs {
            speed_limit_known: true,
            ..driving()
        };
        let layout = compute_layout(&inputs);
        let sign = layout.placement(Indicator::SpeedLimitSign).unwrap();
        assert_eq!(sign.bounds, Rect::new(56, 277, 192, 192));
        assert_eq!(sign.touch, Rect::new(-4, 217, 312, 312));
    }

    #[test]
    fn test_buttons_push_inward() {
        let inputs = LayoutInputs {
            accel_mode_button: true,
            follow_mode_button: true,
            ..driving()
        };
        let layout = compute_layout(&inputs);
        let brake = layout.rect(Indicator::Brake);
        let accel = layout.rect(Indicator::AccelModeButton);
        let follow = layout.rect(Indicator::FollowModeButton);
        assert_eq!(brake.center_x(), 1772);
        // 1772 - (90 + 90 + 72) - 80
        assert_eq!(accel.x, 1440);
        assert_eq!(follow.x, accel.x - 204);

        // Without the brake the accel button takes its place
        let no_brake = compute_layout(&LayoutInputs {
            brake_percent: -1,
            ..inputs
        });
        assert_eq!(no_brake.rect(Indicator::AccelModeButton).x, 1772 - 80);
    }

    #[test]
    fn test_alert_size_moves_buttons_up() {
        let base = compute_layout(&driving()).rect(Indicator::Brake);
        let small = compute_layout(&LayoutInputs {
            alert_size: AlertSize::Small,
            ..driving()
        })
        .rect(Indicator::Brake);
        let mid = compute_layout(&LayoutInputs {
            alert_size: AlertSize::Mid,
            ..driving()
        })
        .rect(Indicator::Brake);
        // 940 -> 2*940/3 + 45 = 671 -> (940 + 90)/2 = 515
        assert_eq!(base.center_y(), 940);
        assert_eq!(small.center_y(), 671);
        assert_eq!(mid.center_y(), 515);

        let full = compute_layout(&LayoutInputs {
            alert_size: AlertSize::Full,
            ..driving()
        });
        assert_eq!(full.rect(Indicator::Brake), Rect::NONE);
        assert!(full.placement(Indicator::DriverFace).is_none());
    }

    #[test]
    fn test_small_alert_mirrors_buttons_left_of_measures() {
        let inputs = LayoutInputs {
            alert_size: AlertSize::Small,
            measure_slots: 3,
            ..driving()
        };
        let layout = compute_layout(&inputs);
        let grid = layout.measure_grid;
        let brake = layout.rect(Indicator::Brake);
        assert!(brake.right() <= grid.x);
    }

    #[test]
    fn test_measure_grid_three_slots() {
        let inputs = LayoutInputs {
            measure_slots: 3,
            ..driving()
        };
        let layout = compute_layout(&inputs);
        assert_eq!(layout.measure_grid, Rect::new(1550, 262, 324, 573));
        assert_eq!(layout.rect(Indicator::Measure(0)), Rect::new(1550, 262, 324, 191));
        assert_eq!(layout.rect(Indicator::Measure(2)), Rect::new(1550, 644, 324, 191));
    }

    #[test]
    fn test_measure_grid_two_columns() {
        let inputs = LayoutInputs {
            measure_slots: 8,
            ..driving()
        };
        let layout = compute_layout(&inputs);
        let first = layout.rect(Indicator::Measure(0));
        let sixth = layout.rect(Indicator::Measure(5));
        assert_eq!(first.y, sixth.y);
        assert_eq!(first.x, sixth.x + first.w);
        assert_eq!(layout.measure_grid.w, 4 * 96);
    }

    #[test]
    fn test_measures_hidden_on_mid_alert() {
        let layout = compute_layout(&LayoutInputs {
            alert_size: AlertSize::Mid,
            measure_slots: 4,
            ..driving()
        });
        assert_eq!(layout.rect(Indicator::Measure(0)), Rect::NONE);
    }

    #[test]
    fn test_screen_dim_grows_when_dimmer() {
        let bright = compute_layout(&driving()).rect(Indicator::ScreenDim);
        let dimmest = compute_layout(&LayoutInputs {
            screen_dim_mode: DimTier::Dimmest,
            ..driving()
        })
        .rect(Indicator::ScreenDim);
        assert_eq!(bright, Rect::around(152, 940, 96));
        assert_eq!(dimmest, Rect::around(152, 940, 288));
    }

    #[test]
    fn test_hit_test() {
        let inputs = LayoutInputs {
            end_to_end: true,
            ..driving()
        };
        let layout = compute_layout(&inputs);
        assert_eq!(layout.hit_test(100, 100), Some(Indicator::MaxSpeed));
        assert_eq!(layout.hit_test(1772, 133), Some(Indicator::SteeringWheel));
        assert_eq!(layout.hit_test(350, 904), Some(Indicator::LanelessButton));
        assert_eq!(layout.hit_test(152, 940), Some(Indicator::ScreenDim));
        assert_eq!(layout.hit_test(960, 540), None);
    }

    #[test]
    fn test_hit_test_skips_degenerate() {
        let layout = Layout {
            claimed: Vec::new(),
            placements: vec![Placement {
                indicator: Indicator::Brake,
                bounds: Rect::NONE,
                touch: Rect::NONE,
            }],
            measure_grid: Rect::NONE,
        };
        assert_eq!(layout.hit_test(1, 1), None);
    }

    #[test]
    fn test_layout_is_idempotent() {
        let inputs = LayoutInputs {
            accel_mode_button: true,
            measure_slots: 6,
            speed_limit_known: true,
            ..driving()
        };
        assert_eq!(compute_layout(&inputs), compute_layout(&inputs));
    }
}
