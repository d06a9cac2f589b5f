//! Measure slot readouts
//!
//! Every [`MeasureKind`] maps to one pure formatting function in
//! [`REGISTRY`]. Missing, stale or non-finite inputs render as `"-"`.

use hud_core::model::*;
use serde::Serialize;

/// 8-bit colour with alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 200);
    pub const GREEN: Rgba = Rgba::new(0, 255, 0, 200);
    pub const ORANGE: Rgba = Rgba::new(255, 188, 3, 200);
    pub const DARK_ORANGE: Rgba = Rgba::new(255, 128, 0, 200);
    pub const RED: Rgba = Rgba::new(255, 0, 0, 200);
    pub const CYAN: Rgba = Rgba::new(84, 207, 249, 200);
    pub const AMBER: Rgba = Rgba::new(255, 169, 63, 200);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// White fading toward red as `p` goes from 0 to 1
    pub fn ramp_down(p: f32) -> Self {
        if !p.is_finite() {
            return Self::WHITE;
        }
        let g = 255 - (0.5 * p * 255.0) as i32;
        let b = 255 - (p * 255.0) as i32;
        Self::new(255, clamp_channel(g), clamp_channel(b), 200)
    }

    /// Red warming toward white as `p` goes from 0 to 1
    pub fn ramp_up(p: f32) -> Self {
        if !p.is_finite() {
            return Self::WHITE;
        }
        let g = ((0.5 + p) * 255.0) as i32;
        let b = (p * 255.0) as i32;
        Self::new(255, clamp_channel(g), clamp_channel(b), 200)
    }
}

fn clamp_channel(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::WHITE
    }
}

/// Text for one measure slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Readout {
    pub label: &'static str,
    pub value: String,
    pub unit: String,
    pub value_color: Rgba,
    pub unit_color: Rgba,
}

impl Readout {
    pub const MISSING: &'static str = "-";

    fn new(label: &'static str, value: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            unit: unit.into(),
            value_color: Rgba::WHITE,
            unit_color: Rgba::WHITE,
        }
    }

    fn missing(label: &'static str) -> Self {
        Self::new(label, Self::MISSING, "")
    }

    fn value_color(mut self, color: Rgba) -> Self {
        self.value_color = color;
        self
    }

    fn unit_color(mut self, color: Rgba) -> Self {
        self.unit_color = color;
        self
    }

    pub fn is_missing(&self) -> bool {
        self.value == Self::MISSING
    }
}

/// Everything a formatter may read. Stale topics are passed as `None`
/// (device) or as an inactive lead.
#[derive(Debug, Clone, Copy)]
pub struct MeasureInputs<'a> {
    pub is_metric: bool,
    pub car: &'a CarState,
    pub controls: &'a ControlsState,
    pub device: Option<&'a DeviceState>,
    pub lead: &'a RadarLead,
    pub plan: &'a LongitudinalPlan,
    pub gps: &'a GpsLocation,
    pub location: &'a LiveLocation,
    /// Percent grade from the GPS estimator once it has enough samples
    pub gps_grade: Option<f32>,
    pub dynamic_follow_active: bool,
    /// Eased follow level in [0, 2]
    pub follow_level: f32,
}

pub type Formatter = fn(&MeasureInputs<'_>) -> Readout;

#[derive(Clone, Copy)]
pub struct MeasureEntry {
    pub kind: MeasureKind,
    pub format: Formatter,
}

impl std::fmt::Debug for MeasureEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeasureEntry").field("kind", &self.kind).finish()
    }
}

macro_rules! registry {
    ($($kind:ident => $format:path),* $(,)?) => {
        /// Formatters in [`MeasureKind`] declaration order
        pub static REGISTRY: [MeasureEntry; MeasureKind::COUNT] = [
            $(MeasureEntry { kind: MeasureKind::$kind, format: $format },)*
        ];
    };
}

registry! {
    SteeringAngle => steering_angle,
    DesiredSteeringAngle => desired_steering_angle,
    SteeringTorqueEps => steering_torque_eps,
    EngineRpm => engine_rpm,
    EngineRpmTempC => engine_rpm_temp_c,
    EngineRpmTempF => engine_rpm_temp_f,
    CoolantTempC => coolant_temp_c,
    CoolantTempF => coolant_temp_f,
    Acceleration => acceleration,
    LatAccel => lat_accel,
    Altitude => altitude,
    PercentGrade => percent_grade,
    PercentGradeDevice => percent_grade_device,
    FollowLevel => follow_level,
    LeadTtc => lead_ttc,
    LeadDistanceLength => lead_distance_length,
    LeadDistanceTime => lead_distance_time,
    LeadDesiredDistanceLength => lead_desired_distance_length,
    LeadDesiredDistanceTime => lead_desired_distance_time,
    LeadCosts => lead_costs,
    LeadVelocityRelative => lead_velocity_relative,
    LeadVelocityAbs => lead_velocity_abs,
    GpsAccuracy => gps_accuracy,
    CpuTempAndPercentF => cpu_temp_and_percent_f,
    CpuTempAndPercentC => cpu_temp_and_percent_c,
    CpuTempF => cpu_temp_f,
    CpuTempC => cpu_temp_c,
    CpuPercent => cpu_percent,
    MemoryTempF => memory_temp_f,
    MemoryTempC => memory_temp_c,
    AmbientTempF => ambient_temp_f,
    AmbientTempC => ambient_temp_c,
    FanSpeedPercent => fan_speed_percent,
    MemoryUsagePercent => memory_usage_percent,
    FreeSpaceStorage => free_space_storage,
    HvbVoltage => hvb_voltage,
    HvbCurrent => hvb_current,
    HvbWattage => hvb_wattage,
    HvbWattVolt => hvb_watt_volt,
    VisionCurLatAccel => vision_cur_lat_accel,
    VisionMaxVForCurCurv => vision_max_v_for_cur_curv,
    VisionMaxPredLatAccel => vision_max_pred_lat_accel,
}

pub fn entry(kind: MeasureKind) -> &'static MeasureEntry {
    &REGISTRY[kind.index()]
}

pub fn format(kind: MeasureKind, inputs: &MeasureInputs<'_>) -> Readout {
    (entry(kind).format)(inputs)
}

// === Helpers ===

fn finite(v: f32) -> Option<f32> {
    v.is_finite().then_some(v)
}

fn temp_unit(fahrenheit: bool) -> &'static str {
    if fahrenheit {
        "°F"
    } else {
        "°C"
    }
}

fn thermal_color(status: ThermalStatus) -> Rgba {
    match status {
        ThermalStatus::Green => Rgba::GREEN,
        ThermalStatus::Yellow => Rgba::DARK_ORANGE,
        _ => Rgba::RED,
    }
}

/// Engine temperature warning colour, thresholds in the displayed unit
fn coolant_color(celsius: f32, fahrenheit: bool) -> Rgba {
    let (temp, cold, hot, warm) = if fahrenheit {
        ((celsius * 1.8 + 32.5).trunc(), 160.0, 200.0, 190.0)
    } else {
        (celsius, 71.0, 93.0, 87.0)
    };
    if temp < cold {
        Rgba::CYAN
    } else if temp > hot {
        Rgba::RED
    } else if temp > warm {
        Rgba::AMBER
    } else {
        Rgba::WHITE
    }
}

fn display_temp(celsius: f32, fahrenheit: bool) -> f32 {
    if fahrenheit {
        celsius * 1.8 + 32.0
    } else {
        celsius
    }
}

fn speed_unit(is_metric: bool) -> &'static str {
    if is_metric {
        "km/h"
    } else {
        "mph"
    }
}

fn length_unit(is_metric: bool) -> &'static str {
    if is_metric {
        "m"
    } else {
        "ft"
    }
}

fn display_length(meters: f32, is_metric: bool) -> f32 {
    if is_metric {
        meters
    } else {
        meters * 3.280_84
    }
}

fn active_lead<'a>(inputs: &MeasureInputs<'a>) -> Option<&'a RadarLead> {
    inputs.lead.status.then_some(inputs.lead)
}

/// Lead and ego speed when time gaps can be computed
fn lead_with_speed<'a>(inputs: &MeasureInputs<'a>) -> Option<(&'a RadarLead, f32)> {
    let v = inputs.car.v_ego.0;
    active_lead(inputs).filter(|_| v > 0.5).map(|lead| (lead, v))
}

fn cpu_temp(device: &DeviceState) -> Option<f32> {
    device.cpu_temp_c.first().copied().and_then(finite)
}

fn cpu_usage(device: &DeviceState) -> Option<u32> {
    if device.cpu_usage_percent.is_empty() {
        return None;
    }
    let sum: u32 = device.cpu_usage_percent.iter().map(|&p| p as u32).sum();
    Some(sum / device.cpu_usage_percent.len() as u32)
}

// === Steering ===

fn steering_angle(inputs: &MeasureInputs<'_>) -> Readout {
    let Some(angle) = finite(inputs.car.steering_angle.0) else {
        return Readout::missing("REAL STEER");
    };
    Readout::new("REAL STEER", format!("{angle:.0}°"), "")
        .value_color(Rgba::ramp_down(0.0333 * angle.abs()))
}

fn desired_steering_angle(inputs: &MeasureInputs<'_>) -> Readout {
    let angle = inputs.car.steering_angle.0;
    let desired = inputs.controls.steering_angle_desired.0;
    if !inputs.controls.enabled || !angle.is_finite() || !desired.is_finite() {
        return Readout::missing("REL:DES STR.");
    }
    Readout::new("REL:DES STR.", format!("{angle:.0}°:{desired:.0}°"), "")
        .value_color(Rgba::ramp_down(0.0333 * angle.abs()))
}

fn steering_torque_eps(inputs: &MeasureInputs<'_>) -> Readout {
    match finite(inputs.car.steering_torque_eps.0) {
        Some(torque) => Readout::new("EPS TRQ", format!("{torque:.1}"), "Nm"),
        None => Readout::missing("EPS TRQ"),
    }
}

// === Engine ===

fn rpm_text(rpm: f32) -> Option<String> {
    let rpm = finite(rpm)?;
    if rpm == 0.0 {
        Some("OFF".to_string())
    } else {
        Some(format!("{}", ((rpm / 10.0).round() * 10.0) as i32))
    }
}

fn engine_rpm(inputs: &MeasureInputs<'_>) -> Readout {
    match rpm_text(inputs.car.engine_rpm.0) {
        Some(text) => Readout::new("ENG RPM", text, ""),
        None => Readout::missing("ENG RPM"),
    }
}

fn engine_rpm_temp(inputs: &MeasureInputs<'_>, fahrenheit: bool) -> Readout {
    let coolant = inputs.car.engine_coolant_temp.0;
    let (Some(text), Some(coolant)) = (rpm_text(inputs.car.engine_rpm.0), finite(coolant)) else {
        return Readout::missing("ENGINE");
    };
    let temp = display_temp(coolant, fahrenheit);
    Readout::new("ENGINE", text, format!("{temp:.0}{}", temp_unit(fahrenheit)))
        .unit_color(coolant_color(coolant, fahrenheit))
}

fn engine_rpm_temp_c(inputs: &MeasureInputs<'_>) -> Readout {
    engine_rpm_temp(inputs, false)
}

fn engine_rpm_temp_f(inputs: &MeasureInputs<'_>) -> Readout {
    engine_rpm_temp(inputs, true)
}

fn coolant_temp(inputs: &MeasureInputs<'_>, fahrenheit: bool) -> Readout {
    let Some(coolant) = finite(inputs.car.engine_coolant_temp.0) else {
        return Readout::missing("COOLANT");
    };
    let readout = Readout::new(
        "COOLANT",
        format!("{:.0}", display_temp(coolant, fahrenheit)),
        temp_unit(fahrenheit),
    );
    if inputs.car.engine_rpm.0 > 0.0 {
        readout.value_color(coolant_color(coolant, fahrenheit))
    } else {
        readout
    }
}

fn coolant_temp_c(inputs: &MeasureInputs<'_>) -> Readout {
    coolant_temp(inputs, false)
}

fn coolant_temp_f(inputs: &MeasureInputs<'_>) -> Readout {
    coolant_temp(inputs, true)
}

// === Motion ===

fn acceleration(inputs: &MeasureInputs<'_>) -> Readout {
    match finite(inputs.car.a_ego.0) {
        Some(a) => Readout::new("ACCEL", format!("{a:.1}"), "m/s²"),
        None => Readout::missing("ACCEL"),
    }
}

fn lat_accel(inputs: &MeasureInputs<'_>) -> Readout {
    match finite(inputs.location.lat_accel.0) {
        Some(a) => Readout::new("LAT ACC", format!("{a:.1}"), "m/s²"),
        None => Readout::missing("LAT ACC"),
    }
}

fn altitude(inputs: &MeasureInputs<'_>) -> Readout {
    let gps = inputs.gps;
    match finite(gps.altitude.0) {
        Some(alt) if gps.accuracy.0 != 0.0 => Readout::new(
            "ALTITUDE",
            format!("{:.0}", display_length(alt, inputs.is_metric)),
            length_unit(inputs.is_metric),
        ),
        _ => Readout::missing("ALTITUDE"),
    }
}

fn grade_readout(label: &'static str, grade: Option<f32>) -> Readout {
    match grade.and_then(finite) {
        Some(g) => Readout::new(label, format!("{g:.1}%"), "")
            .value_color(Rgba::ramp_down(0.125 * g.abs())),
        None => Readout::missing(label),
    }
}

fn percent_grade(inputs: &MeasureInputs<'_>) -> Readout {
    let grade = inputs.gps_grade.filter(|_| inputs.gps.accuracy.0 != 0.0);
    grade_readout("GRADE (GPS)", grade)
}

fn percent_grade_device(inputs: &MeasureInputs<'_>) -> Readout {
    grade_readout("GRADE", Some(inputs.car.pitch.0.tan() * 100.0))
}

fn follow_level(inputs: &MeasureInputs<'_>) -> Readout {
    if inputs.dynamic_follow_active {
        return match finite(inputs.follow_level) {
            Some(level) => Readout::new("GAP", format!("{level:.1}"), ""),
            None => Readout::missing("GAP"),
        };
    }
    match inputs.car.read_distance_lines {
        1 => Readout::new("GAP", "I", ""),
        2 => Readout::new("GAP", "I I", ""),
        3 => Readout::new("GAP", "I I I", ""),
        _ => Readout::missing("GAP"),
    }
}

// === Lead ===

fn lead_ttc(inputs: &MeasureInputs<'_>) -> Readout {
    let ttc = active_lead(inputs)
        .filter(|lead| lead.v_rel.0 < 0.0)
        .and_then(|lead| finite(-lead.d_rel.0 / lead.v_rel.0));
    let Some(ttc) = ttc else {
        return Readout::missing("TTC");
    };
    let value = if ttc > 99.0 {
        "99+".to_string()
    } else if ttc >= 10.0 {
        format!("{ttc:.0}")
    } else {
        format!("{ttc:.1}")
    };
    Readout::new("TTC", value, "s").value_color(Rgba::ramp_up(0.333 * ttc))
}

fn lead_distance_length(inputs: &MeasureInputs<'_>) -> Readout {
    let Some(d) = active_lead(inputs).and_then(|lead| finite(lead.d_rel.0)) else {
        return Readout::missing("REL DIST");
    };
    let p = if inputs.is_metric {
        0.0333 * d
    } else {
        0.01 * d * 3.281
    };
    Readout::new(
        "REL DIST",
        format!("{:.0}", display_length(d, inputs.is_metric)),
        length_unit(inputs.is_metric),
    )
    .value_color(Rgba::ramp_up(p))
}

fn lead_distance_time(inputs: &MeasureInputs<'_>) -> Readout {
    let Some(t) = lead_with_speed(inputs).and_then(|(lead, v)| finite(lead.d_rel.0 / v)) else {
        return Readout::missing("REL DIST");
    };
    Readout::new("REL DIST", format!("{t:.1}"), "s").value_color(Rgba::ramp_up(0.6667 * t))
}

fn lead_desired_distance_length(inputs: &MeasureInputs<'_>) -> Readout {
    let Some(lead) = active_lead(inputs) else {
        return Readout::missing("REL:DES DIST");
    };
    let plan = inputs.plan;
    let follow = plan.desired_follow_distance * inputs.car.v_ego.0 + plan.stopping_distance.0;
    let (Some(d), Some(follow)) = (finite(lead.d_rel.0), finite(follow)) else {
        return Readout::missing("REL:DES DIST");
    };
    let metric = inputs.is_metric;
    Readout::new(
        "REL:DES DIST",
        format!(
            "{}:{}",
            display_length(d, metric) as i32,
            display_length(follow, metric) as i32
        ),
        length_unit(metric),
    )
}

fn lead_desired_distance_time(inputs: &MeasureInputs<'_>) -> Readout {
    let Some((lead, v)) = lead_with_speed(inputs) else {
        return Readout::missing("REL:DES DIST");
    };
    let plan = inputs.plan;
    let t = lead.d_rel.0 / v;
    let desired = plan.desired_follow_distance + plan.stopping_distance.0 / v;
    match (finite(t), finite(desired)) {
        (Some(t), Some(desired)) => {
            Readout::new("REL:DES DIST", format!("{t:.1}:{desired:.1}"), "s")
        }
        _ => Readout::missing("REL:DES DIST"),
    }
}

fn lead_costs(inputs: &MeasureInputs<'_>) -> Readout {
    let plan = inputs.plan;
    match lead_with_speed(inputs) {
        Some(_) if plan.lead_dist_cost.is_finite() && plan.lead_accel_cost.is_finite() => {
            Readout::new(
                "D:A COST",
                format!("{:.1}:{:.1}", plan.lead_dist_cost, plan.lead_accel_cost),
                "",
            )
        }
        _ => Readout::missing("D:A COST"),
    }
}

fn lead_velocity_relative(inputs: &MeasureInputs<'_>) -> Readout {
    let Some(v_rel) = active_lead(inputs).and_then(|lead| finite(lead.v_rel.0)) else {
        return Readout::missing("REL SPEED");
    };
    let shown = if inputs.is_metric {
        v_rel * 3.6
    } else {
        v_rel * 2.237_414_4
    };
    Readout::new("REL SPEED", format!("{shown:.1}"), speed_unit(inputs.is_metric))
        .value_color(Rgba::ramp_down(-0.2 * v_rel))
}

fn lead_velocity_abs(inputs: &MeasureInputs<'_>) -> Readout {
    let speed = active_lead(inputs)
        .and_then(|lead| finite(lead.v_lead.display(inputs.is_metric)));
    let Some(speed) = speed else {
        return Readout::missing("LEAD SPD");
    };
    let value = if speed < 100.0 {
        format!("{speed:.1}")
    } else {
        format!("{speed:.0}")
    };
    Readout::new("LEAD SPD", value, speed_unit(inputs.is_metric))
}

// === Location ===

fn gps_accuracy(inputs: &MeasureInputs<'_>) -> Readout {
    let gps = inputs.gps;
    let acc = gps.accuracy.0;
    if acc == 0.0 || !acc.is_finite() {
        return Readout::missing("GPS PREC");
    }
    let value = if acc > 99.0 {
        "None".to_string()
    } else if acc > 9.99 {
        format!("{acc:.1}")
    } else {
        format!("{acc:.2}")
    };
    let color = if acc > 1.3 {
        Rgba::RED
    } else if acc > 0.85 {
        Rgba::ORANGE
    } else {
        Rgba::WHITE
    };
    Readout::new("GPS PREC", value, gps.satellite_count.to_string()).value_color(color)
}

// === Device ===

fn cpu_temp_and_percent(inputs: &MeasureInputs<'_>, fahrenheit: bool) -> Readout {
    let Some(device) = inputs.device else {
        return Readout::missing("CPU");
    };
    let (Some(temp), Some(usage)) = (cpu_temp(device), cpu_usage(device)) else {
        return Readout::missing("CPU");
    };
    Readout::new(
        "CPU",
        format!("{:.0}{}", display_temp(temp, fahrenheit), temp_unit(fahrenheit)),
        format!("{usage}%"),
    )
    .value_color(thermal_color(device.thermal_status))
}

fn cpu_temp_and_percent_f(inputs: &MeasureInputs<'_>) -> Readout {
    cpu_temp_and_percent(inputs, true)
}

fn cpu_temp_and_percent_c(inputs: &MeasureInputs<'_>) -> Readout {
    cpu_temp_and_percent(inputs, false)
}

fn device_temp(
    inputs: &MeasureInputs<'_>,
    label: &'static str,
    fahrenheit: bool,
    read: fn(&DeviceState) -> Option<f32>,
) -> Readout {
    match inputs.device.and_then(|d| read(d).map(|t| (d, t))) {
        Some((device, temp)) => Readout::new(
            label,
            format!("{:.0}", display_temp(temp, fahrenheit)),
            temp_unit(fahrenheit),
        )
        .value_color(thermal_color(device.thermal_status)),
        None => Readout::missing(label),
    }
}

fn cpu_temp_f(inputs: &MeasureInputs<'_>) -> Readout {
    device_temp(inputs, "CPU TEMP", true, cpu_temp)
}

fn cpu_temp_c(inputs: &MeasureInputs<'_>) -> Readout {
    device_temp(inputs, "CPU TEMP", false, cpu_temp)
}

fn memory_temp_f(inputs: &MeasureInputs<'_>) -> Readout {
    device_temp(inputs, "MEM TEMP", true, |d| finite(d.memory_temp_c.0))
}

fn memory_temp_c(inputs: &MeasureInputs<'_>) -> Readout {
    device_temp(inputs, "MEM TEMP", false, |d| finite(d.memory_temp_c.0))
}

fn ambient_temp_f(inputs: &MeasureInputs<'_>) -> Readout {
    device_temp(inputs, "AMB TEMP", true, |d| finite(d.ambient_temp_c.0))
}

fn ambient_temp_c(inputs: &MeasureInputs<'_>) -> Readout {
    device_temp(inputs, "AMB TEMP", false, |d| finite(d.ambient_temp_c.0))
}

fn cpu_percent(inputs: &MeasureInputs<'_>) -> Readout {
    match inputs.device.and_then(cpu_usage) {
        Some(usage) => Readout::new("CPU PERC", usage.to_string(), "%")
            .value_color(Rgba::ramp_down(0.01 * usage as f32)),
        None => Readout::missing("CPU PERC"),
    }
}

fn fan_speed_percent(inputs: &MeasureInputs<'_>) -> Readout {
    match inputs.device {
        Some(device) => {
            let fan = device.fan_speed_percent;
            Readout::new("FAN", fan.to_string(), "%")
                .value_color(Rgba::ramp_down(0.01 * fan as f32))
        }
        None => Readout::missing("FAN"),
    }
}

fn memory_usage_percent(inputs: &MeasureInputs<'_>) -> Readout {
    match inputs.device {
        Some(device) => {
            let mem = device.memory_usage_percent;
            Readout::new("MEM USED", mem.to_string(), "%")
                .value_color(Rgba::ramp_down(0.011_764_706 * mem as f32))
        }
        None => Readout::missing("MEM USED"),
    }
}

fn free_space_storage(inputs: &MeasureInputs<'_>) -> Readout {
    match inputs.device.and_then(|d| finite(d.free_space_percent)) {
        Some(free) => Readout::new("SSD FREE", format!("{free:.0}"), "%")
            .value_color(Rgba::ramp_up(0.05 * free)),
        None => Readout::missing("SSD FREE"),
    }
}

// === High voltage battery ===

fn hvb_voltage(inputs: &MeasureInputs<'_>) -> Readout {
    match finite(inputs.car.hvb_voltage.0) {
        Some(v) => Readout::new("HVB VOLT", format!("{v:.0}"), "V")
            .value_color(Rgba::ramp_down((v - 360.0).abs() * 0.016_666_67)),
        None => Readout::missing("HVB VOLT"),
    }
}

fn hvb_current(inputs: &MeasureInputs<'_>) -> Readout {
    let Some(current) = finite(-inputs.car.hvb_current.0) else {
        return Readout::missing("HVB CUR");
    };
    let value = if current.abs() >= 100.0 {
        format!("{current:.0}")
    } else {
        format!("{current:.1}")
    };
    Readout::new("HVB CUR", value, "A")
}

fn hvb_wattage(inputs: &MeasureInputs<'_>) -> Readout {
    match finite(-inputs.car.hvb_wattage) {
        Some(kw) => Readout::new("HVB POW", format!("{kw:.1}"), "kW"),
        None => Readout::missing("HVB POW"),
    }
}

fn hvb_watt_volt(inputs: &MeasureInputs<'_>) -> Readout {
    let car = inputs.car;
    match (finite(-car.hvb_wattage), finite(car.hvb_voltage.0)) {
        (Some(kw), Some(v)) => Readout::new("HVB kW", format!("{kw:.1}"), format!("{v:.0}V")),
        _ => Readout::missing("HVB kW"),
    }
}

// === Vision turn controller ===

fn vision_cur_lat_accel(inputs: &MeasureInputs<'_>) -> Readout {
    match finite(inputs.plan.vision_current_lat_accel.0) {
        Some(a) => Readout::new("V:LAT ACC", format!("{a:.1}"), "m/s²"),
        None => Readout::missing("V:LAT ACC"),
    }
}

fn vision_max_v_for_cur_curv(inputs: &MeasureInputs<'_>) -> Readout {
    let speed = inputs.plan.vision_max_v_current_curvature;
    match finite(speed.display(inputs.is_metric)) {
        Some(v) => Readout::new("V:MX CUR V", format!("{v:.0}"), speed_unit(inputs.is_metric)),
        None => Readout::missing("V:MX CUR V"),
    }
}

fn vision_max_pred_lat_accel(inputs: &MeasureInputs<'_>) -> Readout {
    match finite(inputs.plan.vision_max_predicted_lat_accel.0) {
        Some(a) => Readout::new("V:MX PLA", format!("{a:.1}"), "m/s²"),
        None => Readout::missing("V:MX PLA"),
    }
}
