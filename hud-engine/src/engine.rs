//! Per-tick engine state
//!
//! `EngineContext` owns everything that evolves from tick to tick: the
//! telemetry store, the projector and its calibration, the animation
//! controllers and the grade estimator. A tick never fails; bad input
//! degrades to defaults, sentinels or hidden geometry.

use crate::animation::{AnimationController, DimmingController, FadeController, LevelEase};
use crate::config::EngineConfig;
use crate::grade::GradeEstimator;
use crate::layout::{compute_layout, LayoutInputs};
use crate::measures::{self, MeasureInputs};
use crate::projection::{Calibration, Projector, SceneGeometry};
use crate::scene::{HudStatus, SceneSnapshot};
use crate::store::TelemetryStore;
use chrono::Utc;
use hud_core::model::*;
use tracing::{debug, info, warn};

/// km/h to mph, for the set speed which arrives in km/h
const KPH_TO_MPH: f32 = 0.621_371;

pub struct EngineContext {
    config: EngineConfig,
    store: TelemetryStore,
    projector: Projector,
    settings: HudSettings,
    stored_settings: Option<HudSettings>,

    frame: u64,
    last_now: Option<f64>,
    started: bool,
    world_objects_visible: bool,
    geometry: SceneGeometry,

    dimming: DimmingController,
    brake_fade: FadeController,
    one_pedal_fade: FadeController,
    follow_level: LevelEase,
    grade: GradeEstimator,
}

impl EngineContext {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            store: TelemetryStore::new(),
            projector: Projector::new(&config),
            settings: HudSettings::default(),
            stored_settings: None,
            frame: 0,
            last_now: None,
            started: false,
            world_objects_visible: false,
            geometry: SceneGeometry::default(),
            dimming: DimmingController::new(&config.dimming),
            brake_fade: FadeController::brake(&config.fades),
            one_pedal_fade: FadeController::one_pedal(&config.fades),
            follow_level: LevelEase::new(&config.fades),
            grade: GradeEstimator::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn settings(&self) -> &HudSettings {
        &self.settings
    }

    pub fn store(&self) -> &TelemetryStore {
        &self.store
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn apply_settings(&mut self, settings: HudSettings) {
        if settings != self.settings {
            debug!(?settings, "Applying settings");
            self.settings = settings;
        }
    }

    /// Apply settings read from the settings store.
    ///
    /// Store reads and `Settings` messages write the same slot and the most
    /// recent change wins: a store value that has not changed since the last
    /// read does not overwrite a newer `Settings` message.
    pub fn apply_stored_settings(&mut self, settings: HudSettings) {
        if self.stored_settings.as_ref() == Some(&settings) {
            return;
        }
        self.stored_settings = Some(settings.clone());
        self.apply_settings(settings);
    }

    /// Run one tick at `now` (seconds, monotonic) with the messages that
    /// arrived since the previous tick
    pub fn tick<I>(&mut self, now: f64, messages: I) -> SceneSnapshot
    where
        I: IntoIterator<Item = TelemetryMessage>,
    {
        self.frame += 1;
        let frame = self.frame;
        self.store.begin_tick(frame);
        for message in messages {
            self.store.ingest(message, frame);
        }

        if self.store.updated(Topic::Settings) {
            if let Some(settings) = self.store.settings().cloned() {
                self.apply_settings(settings);
            }
        }

        let status = HudStatus::from_controls(self.store.controls_state());
        self.update_calibration();
        if self.store.updated(Topic::ModelV2) || self.store.updated(Topic::LiveCalibration) {
            self.geometry = self
                .projector
                .project_model(self.store.model(), &self.config.draw);
        }

        let timeout = self.config.stale_timeout_ticks();
        let panda_stale = self.store.is_stale(Topic::PandaState, timeout);
        let device_stale = self.store.is_stale(Topic::DeviceState, timeout);
        let radar_stale = self.store.is_stale(Topic::RadarState, timeout);
        let gps_stale = self.store.is_stale(Topic::GpsLocation, timeout);

        self.update_started(now, device_stale, panda_stale);
        self.advance_animations(now, status);

        let dt = match self.last_now {
            Some(last) if now > last => (now - last) as f32,
            _ => 0.0,
        };
        self.last_now = Some(now);
        if self.started && !gps_stale && self.store.gps_location().accuracy.0 != 0.0 {
            self.grade.update(
                self.store.car_state().v_ego.0,
                dt,
                self.store.gps_location().altitude.0,
            );
        }

        self.build_snapshot(status, device_stale, panda_stale, radar_stale)
    }

    fn update_calibration(&mut self) {
        if !self.store.updated(Topic::LiveCalibration) {
            return;
        }
        let rpy = self.store.live_calibration().rpy_calib;
        match Calibration::from_rpy(rpy) {
            Ok(calibration) => {
                if !self.world_objects_visible {
                    info!("Calibration valid, showing world objects");
                }
                self.projector.set_calibration(calibration);
                self.world_objects_visible = true;
            }
            Err(e) => {
                warn!("Keeping last good calibration: {}", e);
                self.world_objects_visible = false;
            }
        }
    }

    fn update_started(&mut self, now: f64, device_stale: bool, panda_stale: bool) {
        let started = !device_stale
            && self.store.device_state().started
            && !panda_stale
            && self.store.panda_state().ignition();

        if started && !self.started {
            info!(frame = self.frame, "On-road session started");
            self.one_pedal_fade
                .hold_until(now + self.config.fades.one_pedal_holdoff_secs as f64);
        } else if !started && self.started {
            info!(frame = self.frame, "On-road session ended");
        }
        if !started {
            self.grade.reset();
        }
        self.started = started;
    }

    fn one_pedal_shown(&self, status: HudStatus) -> bool {
        let car = self.store.car_state();
        let controls = self.store.controls_state();
        car.one_pedal_active
            || car.coast_one_pedal_active
            || (status == HudStatus::Disengaged
                && controls.v_cruise <= 3.0
                && (self.settings.one_pedal_mode || self.settings.disable_disengage_on_gas))
    }

    fn advance_animations(&mut self, now: f64, status: HudStatus) {
        self.dimming
            .update(self.started, status, self.settings.screen_dim_mode);
        self.dimming.advance(now);

        let brake = self.store.car_state().friction_brake_percent;
        self.brake_fade
            .set_on(brake > self.config.fades.brake_threshold_percent);
        self.brake_fade.advance(now);

        let one_pedal = self.one_pedal_shown(status);
        self.one_pedal_fade.set_on(one_pedal);
        self.one_pedal_fade.advance(now);

        self.follow_level
            .set_level(self.store.longitudinal_plan().dynamic_follow_level);
        self.follow_level.advance(now);
    }

    fn build_snapshot(
        &self,
        status: HudStatus,
        device_stale: bool,
        panda_stale: bool,
        radar_stale: bool,
    ) -> SceneSnapshot {
        let store = &self.store;
        let settings = &self.settings;
        let car = store.car_state();
        let controls = store.controls_state();
        let plan = store.longitudinal_plan();
        let is_metric = settings.is_metric;

        let no_lead = RadarLead::default();
        let lead = if radar_stale {
            &no_lead
        } else {
            &store.radar_state().lead_one
        };
        let device = (!device_stale).then(|| store.device_state());

        let layout = compute_layout(&LayoutInputs {
            fb_width: self.config.display.framebuffer_width,
            fb_height: self.config.display.framebuffer_height,
            started: self.started,
            alert_size: controls.alert_size,
            engageable: controls.engageable,
            vision_turn_box: settings.show_debug_ui
                && plan.vision_turn_state > VisionTurnState::Disabled,
            one_pedal_fade: self.one_pedal_fade.value(),
            speed_limit_known: plan.speed_limit.0 > 0.0,
            brake_percent: car.friction_brake_percent,
            accel_mode_button: settings.accel_mode_button,
            follow_mode_button: settings.dynamic_follow_button,
            end_to_end: settings.end_to_end,
            screen_dim_mode: settings.screen_dim_mode,
            measure_slots: settings.measure_slot_count(),
        });

        let inputs = MeasureInputs {
            is_metric,
            car,
            controls,
            device,
            lead,
            plan,
            gps: store.gps_location(),
            location: store.live_location(),
            gps_grade: self.grade.grade(),
            dynamic_follow_active: settings.dynamic_follow_active,
            follow_level: self.follow_level.value(),
        };
        let readouts = settings
            .measure_slots
            .iter()
            .take(settings.measure_slot_count())
            .map(|kind| measures::format(*kind, &inputs))
            .collect();

        let v_cruise = controls.v_cruise;
        let set_speed = (v_cruise > 0.0 && v_cruise != SET_SPEED_NA).then(|| {
            if is_metric {
                v_cruise
            } else {
                v_cruise * KPH_TO_MPH
            }
        });
        let speed_limit = (plan.speed_limit.0 > 0.0).then(|| plan.speed_limit.display(is_metric));

        SceneSnapshot {
            frame: self.frame,
            timestamp: Utc::now(),
            status,
            started: self.started,
            engageable: controls.engageable,
            is_metric,
            alert_size: controls.alert_size,
            world_objects_visible: self.world_objects_visible,
            geometry: self.geometry.clone(),
            brightness: self.dimming.value(),
            dim_tier: self.dimming.tier(),
            brake_fade: self.brake_fade.value(),
            one_pedal_fade: self.one_pedal_fade.value(),
            follow_level: self.follow_level.value(),
            speed: car.v_ego.display(is_metric),
            set_speed,
            speed_limit,
            wheel_angle: if settings.wheel_rotates {
                car.steering_angle.0
            } else {
                0.0
            },
            lead_visible: lead.status,
            panda_type: if panda_stale {
                PandaType::Unknown
            } else {
                store.panda_state().panda_type
            },
            thermal_status: device.map(|d| d.thermal_status),
            layout,
            measures: readouts,
        }
    }
}
