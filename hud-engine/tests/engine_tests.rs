//! Integration tests for the tick engine and driver
//!
//! Drives `EngineContext` with hand-built telemetry batches and checks the
//! published snapshots.

use approx::assert_relative_eq;
use hud_core::model::*;
use hud_core::source::{MemorySettings, TelemetrySource};
use hud_core::units::*;
use hud_engine::animation::{AnimationController, DimmingController, Easer};
use hud_engine::config::EngineConfig;
use hud_engine::layout::{compute_layout, Indicator, LayoutInputs, Rect};
use hud_engine::projection::Projector;
use hud_engine::{driver, AppState, EngineContext, HudStatus};
use hud_sources::{DemoSource, ScriptedSource};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DT: f64 = 0.05;

fn session() -> Vec<TelemetryMessage> {
    vec![
        TelemetryMessage::DeviceState(DeviceState {
            started: true,
            cpu_temp_c: vec![52.0],
            cpu_usage_percent: vec![30],
            thermal_status: ThermalStatus::Green,
            ..Default::default()
        }),
        TelemetryMessage::PandaState(PandaState {
            panda_type: PandaType::Dos,
            ignition_line: true,
            ignition_can: true,
        }),
    ]
}

fn controls(enabled: bool, alert_status: AlertStatus) -> TelemetryMessage {
    TelemetryMessage::ControlsState(ControlsState {
        enabled,
        engageable: true,
        alert_status,
        v_cruise: 100.0,
        ..Default::default()
    })
}

/// Run `ticks` empty ticks after `t`, returning the time of the last one
fn idle(engine: &mut EngineContext, mut t: f64, ticks: usize) -> f64 {
    for _ in 0..ticks {
        t += DT;
        engine.tick(t, []);
    }
    t
}

fn model_with_lead(lead_x: f32) -> ModelGeometry {
    let mut model = ModelGeometry {
        position: Trajectory::along(|_| (0.0, 0.0)),
        ..Default::default()
    };
    model.leads[0] = LeadPrediction {
        prob: 0.9,
        x: lead_x,
        y: 0.0,
        v: 0.0,
    };
    model
}

// ==================== Dimming ====================

#[test]
fn test_critical_alert_snaps_to_dimmest() {
    let mut engine = EngineContext::new(EngineConfig::default());
    let mut batch = session();
    batch.push(controls(true, AlertStatus::Normal));
    let snap = engine.tick(0.0, batch);
    assert_eq!(snap.status, HudStatus::Engaged);
    assert_eq!(snap.brightness, 1.0);

    let snap = engine.tick(DT, [controls(true, AlertStatus::Critical)]);
    assert_eq!(snap.status, HudStatus::Alert);
    assert_eq!(snap.brightness, 0.01);
    assert_eq!(snap.dim_tier, DimTier::Dimmest);
}

#[test]
fn test_dimming_eases_to_selected_tier() {
    let mut engine = EngineContext::new(EngineConfig::default());
    engine.apply_settings(HudSettings {
        screen_dim_mode: DimTier::Dim,
        ..Default::default()
    });
    engine.tick(0.0, session());
    let snap = engine.tick(DT, []);
    assert!(snap.brightness < 1.0 && snap.brightness > 0.5);

    let t = idle(&mut engine, DT, 60);
    let snap = engine.tick(t + DT, []);
    assert_relative_eq!(snap.brightness, 0.5);
}

// ==================== Brake fade ====================

#[test]
fn test_brake_fade_reaches_full_after_fade_time() {
    let mut engine = EngineContext::new(EngineConfig::default());
    let car = TelemetryMessage::CarState(CarState {
        friction_brake_percent: 80,
        ..Default::default()
    });
    let snap = engine.tick(0.0, [car]);
    assert_eq!(snap.brake_fade, 0.0);

    let mut t = 0.0;
    let mut last = 0.0;
    for _ in 0..6 {
        t += DT;
        last = engine.tick(t, []).brake_fade;
    }
    assert!((0.99..=1.0).contains(&last), "brake fade {}", last);
}

#[test]
fn test_light_braking_does_not_fade_in() {
    let mut engine = EngineContext::new(EngineConfig::default());
    let car = TelemetryMessage::CarState(CarState {
        friction_brake_percent: 30,
        ..Default::default()
    });
    engine.tick(0.0, [car]);
    let t = idle(&mut engine, 0.0, 10);
    assert_eq!(engine.tick(t + DT, []).brake_fade, 0.0);
}

// ==================== Draw distances ====================

#[test]
fn test_close_lead_truncates_path() {
    let mut engine = EngineContext::new(EngineConfig::default());
    let snap = engine.tick(0.0, [TelemetryMessage::ModelV2(model_with_lead(5.0))]);
    let distances = snap.geometry.distances;
    // gap = 10, minus min(0.35 * 10, 10)
    assert_relative_eq!(distances.path, 6.5);
    assert!(distances.path <= 10.0 * 0.65 + 1e-4);
    assert_relative_eq!(distances.lane_lines, 100.0);
}

#[test]
fn test_close_lead_respects_minimum_draw_distance() {
    let mut config = EngineConfig::default();
    config.draw.min_lead_draw_distance = 8.0;
    let mut engine = EngineContext::new(config);
    let snap = engine.tick(0.0, [TelemetryMessage::ModelV2(model_with_lead(5.0))]);
    assert_relative_eq!(snap.geometry.distances.path, 8.0);
}

#[test]
fn test_geometry_only_recomputed_on_model_update() {
    let mut engine = EngineContext::new(EngineConfig::default());
    let first = engine.tick(0.0, [TelemetryMessage::ModelV2(model_with_lead(30.0))]);
    let second = engine.tick(DT, []);
    assert_eq!(first.geometry, second.geometry);
}

// ==================== Clipping ====================

#[test]
fn test_clip_margin() {
    let mut config = EngineConfig::default();
    config.display.clip_margin = 1000.0;
    let wide = Projector::new(&config);
    let narrow = Projector::new(&EngineConfig::default());

    // Straight ahead at the zoom reference distance, lateral offset maps 1:1 to pixels
    let x = config.display.zoom_reference;
    let half_width = config.display.framebuffer_width as f32 / 2.0;
    let outside_600 = wide.project_xyz(x, half_width + 600.0, 0.0);
    assert_relative_eq!(outside_600.x, 2520.0, epsilon = 0.01);
    assert!(outside_600.visible);
    assert!(!wide.project_xyz(x, half_width + 1600.0, 0.0).visible);
    assert!(!narrow.project_xyz(x, half_width + 600.0, 0.0).visible);
}

// ==================== Staleness ====================

#[test]
fn test_panda_goes_stale_after_timeout() {
    let mut engine = EngineContext::new(EngineConfig::default());
    let snap = engine.tick(0.0, session());
    assert_eq!(snap.panda_type, PandaType::Dos);
    assert!(snap.started);

    // 100 ticks of silence is still within the 5 s window
    let t = idle(&mut engine, 0.0, 100);
    assert_eq!(engine.frame(), 101);
    let snap = engine.tick(t + DT, []);
    assert_eq!(snap.panda_type, PandaType::Unknown);
    assert!(!snap.started);
}

#[test]
fn test_stale_device_blanks_thermal_readouts() {
    let mut engine = EngineContext::new(EngineConfig::default());
    let snap = engine.tick(0.0, session());
    assert_eq!(snap.thermal_status, Some(ThermalStatus::Green));
    assert_eq!(snap.measures[0].value, "52°C");

    let t = idle(&mut engine, 0.0, 101);
    let snap = engine.tick(t + DT, []);
    assert_eq!(snap.thermal_status, None);
    assert_eq!(snap.measures[0].value, "-");
}

#[test]
fn test_stale_radar_drops_lead() {
    let mut engine = EngineContext::new(EngineConfig::default());
    let radar = TelemetryMessage::RadarState(RadarState {
        lead_one: RadarLead {
            status: true,
            d_rel: Meters(25.0),
            v_rel: MetersPerSecond(-1.0),
            v_lead: MetersPerSecond(15.0),
        },
    });
    assert!(engine.tick(0.0, [radar]).lead_visible);
    let t = idle(&mut engine, 0.0, 101);
    assert!(!engine.tick(t + DT, []).lead_visible);
}

// ==================== Calibration ====================

#[test]
fn test_rejected_calibration_keeps_last_good() {
    let mut engine = EngineContext::new(EngineConfig::default());
    let good = TelemetryMessage::LiveCalibration(LiveCalibration {
        rpy_calib: [0.0, 0.05, 0.0],
    });
    let model = TelemetryMessage::ModelV2(model_with_lead(40.0));
    let before = engine.tick(0.0, [good, model.clone()]);
    assert!(before.world_objects_visible);

    let bad = TelemetryMessage::LiveCalibration(LiveCalibration {
        rpy_calib: [0.0, f32::INFINITY, 0.0],
    });
    let after = engine.tick(DT, [bad, model]);
    assert!(!after.world_objects_visible);
    // Geometry still projected through the last good calibration
    assert_eq!(before.geometry, after.geometry);
}

// ==================== One-pedal ====================

#[test]
fn test_one_pedal_icon_held_at_session_start() {
    let mut engine = EngineContext::new(EngineConfig::default());
    engine.apply_settings(HudSettings {
        one_pedal_mode: true,
        ..Default::default()
    });
    let mut batch = session();
    batch.push(TelemetryMessage::ControlsState(ControlsState {
        engageable: true,
        ..Default::default()
    }));
    let snap = engine.tick(0.0, batch);
    assert_eq!(snap.one_pedal_fade, -1.0);
    assert!(snap.layout.placement(Indicator::MaxSpeed).is_some());

    let mut t = 0.0;
    while t < 2.9 {
        t += DT;
        assert_eq!(engine.tick(t, []).one_pedal_fade, -1.0, "moved at {}", t);
    }
    while t < 4.0 {
        t += DT;
        engine.tick(t, []);
    }
    let snap = engine.tick(t + DT, []);
    assert_eq!(snap.one_pedal_fade, 1.0);
    assert_eq!(snap.layout.rect(Indicator::MaxSpeed), Rect::NONE);
    assert!(snap.layout.placement(Indicator::OnePedal).is_some());
}

// ==================== Layout ====================

#[test]
fn test_identical_ticks_give_identical_layout() {
    let mut engine = EngineContext::new(EngineConfig::default());
    let mut batch = session();
    batch.push(controls(true, AlertStatus::Normal));
    let a = engine.tick(0.0, batch.clone());
    let b = engine.tick(DT, batch);
    assert_eq!(a.layout, b.layout);
    assert_ne!(a.layout.rect(Indicator::ScreenDim), Rect::NONE);
}

// ==================== Demo drive ====================

#[test]
fn test_demo_drive_snapshots_are_well_formed() {
    let mut engine = EngineContext::new(EngineConfig::default());
    let mut demo = DemoSource::new();
    demo.start().unwrap();

    let mut saw_track = false;
    let mut calibrated = false;
    for i in 0..400 {
        let batch = demo.poll().unwrap();
        calibrated |= batch
            .iter()
            .any(|m| matches!(m, TelemetryMessage::LiveCalibration(_)));
        let snap = engine.tick(i as f64 * DT, batch);
        // Device and panda state first arrive on the tenth poll
        assert_eq!(snap.started, i >= 9, "tick {}", i);
        assert!((0.01..=1.0).contains(&snap.brightness));
        assert!((0.0..=1.0).contains(&snap.brake_fade));
        assert!((-1.0..=1.0).contains(&snap.one_pedal_fade));
        assert_eq!(snap.world_objects_visible, calibrated, "tick {}", i);
        for line in snap.geometry.lane_lines.iter() {
            assert!(line.len() <= 66);
        }
        saw_track |= !snap.geometry.track.is_empty();
    }
    assert!(saw_track);
}

// ==================== Driver ====================

struct FailingSource {
    active: bool,
}

impl TelemetrySource for FailingSource {
    fn key(&self) -> &str {
        "failing"
    }

    fn name(&self) -> &str {
        "Failing"
    }

    fn start(&mut self) -> anyhow::Result<()> {
        self.active = true;
        Ok(())
    }

    fn stop(&mut self) -> anyhow::Result<()> {
        self.active = false;
        Ok(())
    }

    fn poll(&mut self) -> anyhow::Result<Vec<TelemetryMessage>> {
        anyhow::bail!("bus disconnected")
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[tokio::test]
async fn test_driver_publishes_and_skips_failing_sources() {
    let state = AppState::new();
    let scripted = ScriptedSource::new("script");
    scripted.handle().push(vec![TelemetryMessage::CarState(CarState {
        v_ego: MetersPerSecond(10.0),
        ..Default::default()
    })]);
    state
        .register_source(Box::new(FailingSource { active: false }))
        .await;
    state.register_source(Box::new(scripted)).await;

    let settings = Arc::new(MemorySettings::new(HudSettings {
        is_metric: false,
        ..Default::default()
    }));
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(driver::run(
        state.clone(),
        settings,
        EngineConfig::default(),
        cancel.clone(),
    ));

    tokio::time::sleep(Duration::from_millis(300)).await;
    cancel.cancel();
    handle.await.unwrap();

    let latest = state.scene.latest();
    assert!(latest.frame > 0);
    assert!(!latest.is_metric);
    assert_relative_eq!(latest.speed, 22.369, epsilon = 0.01);

    // Sources are stopped when the driver exits
    let sources = state.sources.read().await;
    assert!(sources.iter().all(|s| !s.is_active()));
}

// ==================== Properties ====================

proptest! {
    #[test]
    fn prop_easer_stays_in_domain_and_never_passes_target(
        start in -1.0f32..1.0,
        rate in 0.0f32..20.0,
        steps in prop::collection::vec((-3.0f32..3.0, 0.0f64..0.5), 1..40),
    ) {
        let mut easer = Easer::new(start, rate, -1.0, 1.0);
        let mut t = 0.0;
        easer.advance(t);
        for (target, dt) in steps {
            easer.set_target(target);
            let before = easer.value();
            let goal = easer.target();
            t += dt;
            easer.advance(t);
            let after = easer.value();
            prop_assert!((-1.0..=1.0).contains(&after));
            let lo = before.min(goal);
            let hi = before.max(goal);
            prop_assert!(after >= lo && after <= hi, "{} not between {} and {}", after, before, goal);
        }
    }

    #[test]
    fn prop_dimming_stays_within_tiers(
        events in prop::collection::vec((any::<bool>(), 0usize..4, 0usize..3, 0.0f64..1.0), 1..40),
    ) {
        let mut dim = DimmingController::new(&EngineConfig::default().dimming);
        let statuses = [HudStatus::Disengaged, HudStatus::Engaged, HudStatus::Warning, HudStatus::Alert];
        let mut t = 0.0;
        for (started, status, tier, dt) in events {
            dim.update(started, statuses[status], DimTier::ALL[tier]);
            t += dt;
            dim.advance(t);
            prop_assert!((0.01..=1.0).contains(&dim.value()));
        }
    }

    #[test]
    fn prop_projection_is_deterministic(
        x in -50.0f32..200.0,
        y in -50.0f32..50.0,
        z in -5.0f32..5.0,
    ) {
        let projector = Projector::new(&EngineConfig::default());
        let a = projector.project_xyz(x, y, z);
        let b = projector.project_xyz(x, y, z);
        prop_assert_eq!(a.visible, b.visible);
        if a.visible {
            prop_assert!(a.x.is_finite() && a.y.is_finite());
            prop_assert_eq!(a.x.to_bits(), b.x.to_bits());
            prop_assert_eq!(a.y.to_bits(), b.y.to_bits());
        }
    }

    #[test]
    fn prop_ribbon_has_two_vertices_per_sample(
        half_width in 0.01f32..2.0,
        distance in 8.0f32..100.0,
    ) {
        let projector = Projector::new(&EngineConfig::default());
        let mut line = Trajectory::default();
        for i in 0..TRAJECTORY_SIZE {
            line.x.push(5.0 + 3.0 * i as f32);
            line.y.push(0.0);
            line.z.push(0.0);
        }
        let max_idx = hud_engine::projection::path_length_index(&line, distance);
        let ribbon = projector.build_ribbon(&line, half_width, 0.0, max_idx);
        prop_assert_eq!(ribbon.len(), 2 * (max_idx + 1));
        prop_assert!(ribbon.len() <= 66);
    }

    #[test]
    fn prop_layout_is_idempotent_and_never_hits_none(
        started in any::<bool>(),
        engageable in any::<bool>(),
        alert in 0usize..4,
        brake in -1i32..100,
        buttons in any::<(bool, bool, bool)>(),
        slots in 0usize..12,
        dim in 0usize..3,
        px in 0i32..1920,
        py in 0i32..1080,
    ) {
        let sizes = [AlertSize::None, AlertSize::Small, AlertSize::Mid, AlertSize::Full];
        let inputs = LayoutInputs {
            started,
            engageable,
            alert_size: sizes[alert],
            brake_percent: brake,
            accel_mode_button: buttons.0,
            follow_mode_button: buttons.1,
            end_to_end: buttons.2,
            measure_slots: slots,
            screen_dim_mode: DimTier::ALL[dim],
            ..Default::default()
        };
        let layout = compute_layout(&inputs);
        prop_assert_eq!(&layout, &compute_layout(&inputs));
        if let Some(hit) = layout.hit_test(px, py) {
            prop_assert!(!layout.rect(hit).is_degenerate());
        }
        prop_assert!(!layout.hit_test(1, 1).is_some_and(|i| layout.rect(i) == Rect::NONE));
    }
}
