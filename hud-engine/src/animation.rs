//! Time-based animation controllers
//!
//! Each controller eases a scalar toward a target at a fixed rate, using the
//! time elapsed since its own previous `advance`. Values never leave the
//! controller's domain and never step past the target.

use crate::config::{DimmingConfig, FadeConfig};
use crate::scene::HudStatus;
use hud_core::model::DimTier;

pub trait AnimationController {
    /// Move toward the target using the time since the previous call
    fn advance(&mut self, now: f64);
    fn value(&self) -> f32;
    fn target(&self) -> f32;
    fn domain(&self) -> (f32, f32);
}

// === Easer ===

/// Linear ease toward a target, clamped to a domain
#[derive(Debug, Clone)]
pub struct Easer {
    current: f32,
    target: f32,
    rate: f32,
    min: f32,
    max: f32,
    last: Option<f64>,
}

impl Easer {
    pub fn new(initial: f32, rate: f32, min: f32, max: f32) -> Self {
        let initial = initial.clamp(min, max);
        Self {
            current: initial,
            target: initial,
            rate,
            min,
            max,
            last: None,
        }
    }

    /// Non-finite targets are ignored
    pub fn set_target(&mut self, target: f32) {
        if target.is_finite() {
            self.target = target.clamp(self.min, self.max);
        }
    }

    pub fn set_rate(&mut self, rate: f32) {
        if rate.is_finite() && rate >= 0.0 {
            self.rate = rate;
        }
    }

    /// Jump straight to `value` and make it the target
    pub fn snap(&mut self, value: f32) {
        if value.is_finite() {
            self.current = value.clamp(self.min, self.max);
            self.target = self.current;
        }
    }

    /// Record `now` without moving
    pub fn hold(&mut self, now: f64) {
        self.last = Some(now);
    }
}

impl AnimationController for Easer {
    fn advance(&mut self, now: f64) {
        let dt = match self.last {
            Some(last) if now > last => (now - last) as f32,
            _ => 0.0,
        };
        self.last = Some(now);

        let step = self.rate * dt;
        if self.current < self.target {
            self.current = (self.current + step).min(self.target);
        } else if self.current > self.target {
            self.current = (self.current - step).max(self.target);
        }
        self.current = self.current.clamp(self.min, self.max);
    }

    fn value(&self) -> f32 {
        self.current
    }

    fn target(&self) -> f32 {
        self.target
    }

    fn domain(&self) -> (f32, f32) {
        (self.min, self.max)
    }
}

// === Dimming ===

/// Screen brightness, eased between the configured tiers
#[derive(Debug, Clone)]
pub struct DimmingController {
    easer: Easer,
    config: DimmingConfig,
    tier: DimTier,
}

impl DimmingController {
    pub fn new(config: &DimmingConfig) -> Self {
        let tier = DimTier::BRIGHTEST;
        let value = config.tiers[tier.index()];
        Self {
            easer: Easer::new(value, 0.0, config.tiers[0], config.tiers[2]),
            config: config.clone(),
            tier,
        }
    }

    /// Tier currently being faded to
    pub fn tier(&self) -> DimTier {
        self.tier
    }

    /// Choose the target tier from the vehicle state and the driver's setting
    pub fn update(&mut self, started: bool, status: HudStatus, selected: DimTier) {
        let (tier, snap) = if !started {
            (DimTier::BRIGHTEST, true)
        } else {
            match status {
                HudStatus::Alert => (self.config.critical_tier, true),
                HudStatus::Warning => (selected.shifted(self.config.warning_shift), false),
                _ => (selected, false),
            }
        };

        let value = self.config.tiers[tier.index()];
        if snap {
            self.easer.snap(value);
        } else if tier != self.tier {
            let prev = self.config.tiers[self.tier.index()];
            let dur = if value > prev {
                self.config.fade_up_secs
            } else {
                self.config.fade_down_secs
            };
            self.easer.set_rate((value - prev).abs() / dur);
            self.easer.set_target(value);
        } else {
            self.easer.set_target(value);
        }
        self.tier = tier;
    }
}

impl AnimationController for DimmingController {
    fn advance(&mut self, now: f64) {
        self.easer.advance(now)
    }

    fn value(&self) -> f32 {
        self.easer.value()
    }

    fn target(&self) -> f32 {
        self.easer.target()
    }

    fn domain(&self) -> (f32, f32) {
        self.easer.domain()
    }
}

// === Fades ===

/// Bistable fade between the ends of its domain
#[derive(Debug, Clone)]
pub struct FadeController {
    easer: Easer,
    hold_until: Option<f64>,
}

impl FadeController {
    pub fn new(fade_secs: f32, min: f32, max: f32) -> Self {
        Self {
            easer: Easer::new(min, 1.0 / fade_secs, min, max),
            hold_until: None,
        }
    }

    /// Brake indicator fade over [0, 1]
    pub fn brake(config: &FadeConfig) -> Self {
        Self::new(config.fade_secs, 0.0, 1.0)
    }

    /// One-pedal / max-speed fade; +1 shows the one-pedal icon
    pub fn one_pedal(config: &FadeConfig) -> Self {
        let (lo, hi) = config.one_pedal_domain;
        Self::new(config.fade_secs, lo, hi)
    }

    /// Fade toward the upper end of the domain when `on`, else the lower end
    pub fn set_on(&mut self, on: bool) {
        let (lo, hi) = self.easer.domain();
        self.easer.set_target(if on { hi } else { lo });
    }

    /// Keep the value still until `until`
    pub fn hold_until(&mut self, until: f64) {
        self.hold_until = Some(until);
    }
}

impl AnimationController for FadeController {
    fn advance(&mut self, now: f64) {
        match self.hold_until {
            Some(until) if now < until => self.easer.hold(now),
            _ => self.easer.advance(now),
        }
    }

    fn value(&self) -> f32 {
        self.easer.value()
    }

    fn target(&self) -> f32 {
        self.easer.target()
    }

    fn domain(&self) -> (f32, f32) {
        self.easer.domain()
    }
}

/// Follow-distance level shown on the follow button, in [0, 2]
#[derive(Debug, Clone)]
pub struct LevelEase {
    easer: Easer,
}

impl LevelEase {
    pub fn new(config: &FadeConfig) -> Self {
        Self {
            easer: Easer::new(0.0, 1.0 / config.follow_level_secs, 0.0, 2.0),
        }
    }

    pub fn set_level(&mut self, level: f32) {
        self.easer.set_target(level);
    }
}

impl AnimationController for LevelEase {
    fn advance(&mut self, now: f64) {
        self.easer.advance(now)
    }

    fn value(&self) -> f32 {
        self.easer.value()
    }

    fn target(&self) -> f32 {
        self.easer.target()
    }

    fn domain(&self) -> (f32, f32) {
        self.easer.domain()
    }
}
