//! Percent grade from GPS altitude over distance travelled

/// Samples kept in the ring
pub const GRADE_SAMPLES: usize = 10;
/// Distance between samples (m)
pub const GRADE_SAMPLE_SPACING: f32 = 5.0;
/// Distance required before a grade is reported (m)
pub const GRADE_MIN_DISTANCE: f32 = 200.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Sample {
    distance: f32,
    altitude: f32,
}

#[derive(Debug, Clone, Default)]
pub struct GradeEstimator {
    samples: [Sample; GRADE_SAMPLES],
    next: usize,
    rolled: bool,
    odometer: f32,
    last_sample_at: Option<f32>,
}

impl GradeEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Integrate `speed * dt` and record an altitude sample every few meters.
    /// Non-finite inputs are dropped.
    pub fn update(&mut self, speed: f32, dt: f32, altitude: f32) {
        if !speed.is_finite() || !dt.is_finite() || !altitude.is_finite() || dt <= 0.0 {
            return;
        }
        self.odometer += speed.abs() * dt;

        let due = match self.last_sample_at {
            Some(at) => self.odometer - at >= GRADE_SAMPLE_SPACING,
            None => true,
        };
        if !due {
            return;
        }
        self.samples[self.next] = Sample {
            distance: self.odometer,
            altitude,
        };
        self.last_sample_at = Some(self.odometer);
        self.next = (self.next + 1) % GRADE_SAMPLES;
        if self.next == 0 {
            self.rolled = true;
        }
    }

    /// Distance covered since the last reset (m)
    pub fn odometer(&self) -> f32 {
        self.odometer
    }

    /// Mean grade in percent over the ring, once enough road is covered
    pub fn grade(&self) -> Option<f32> {
        if !self.rolled || self.odometer < GRADE_MIN_DISTANCE {
            return None;
        }
        // Oldest sample sits at `next` once the ring has rolled
        let ordered = (0..GRADE_SAMPLES).map(|i| self.samples[(self.next + i) % GRADE_SAMPLES]);
        let (sum, count) = ordered
            .clone()
            .zip(ordered.skip(1))
            .filter_map(|(a, b)| {
                let run = b.distance - a.distance;
                (run > 0.0).then(|| (b.altitude - a.altitude) / run)
            })
            .fold((0.0, 0usize), |(sum, n), g| (sum + g, n + 1));
        if count == 0 {
            return None;
        }
        let grade = sum / count as f32 * 100.0;
        grade.is_finite().then_some(grade)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn drive(est: &mut GradeEstimator, meters: f32, slope: f32) {
        // 20 m/s at 20 Hz is 1 m per tick
        let start = est.odometer();
        let mut d = start;
        while d < start + meters {
            est.update(20.0, 0.05, 100.0 + slope * (d + 1.0));
            d += 1.0;
        }
    }

    #[test]
    fn test_no_grade_before_min_distance() {
        let mut est = GradeEstimator::new();
        drive(&mut est, 100.0, 0.04);
        assert!(est.grade().is_none());
    }

    #[test]
    fn test_constant_slope() {
        let mut est = GradeEstimator::new();
        drive(&mut est, 250.0, 0.04);
        let grade = est.grade().unwrap();
        assert_relative_eq!(grade, 4.0, epsilon = 0.05);
    }

    #[test]
    fn test_downhill() {
        let mut est = GradeEstimator::new();
        drive(&mut est, 250.0, -0.02);
        assert_relative_eq!(est.grade().unwrap(), -2.0, epsilon = 0.05);
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut est = GradeEstimator::new();
        est.update(f32::NAN, 0.05, 10.0);
        est.update(10.0, 0.05, f32::INFINITY);
        assert_eq!(est.odometer(), 0.0);
    }

    #[test]
    fn test_standing_still_records_one_sample() {
        let mut est = GradeEstimator::new();
        for _ in 0..500 {
            est.update(0.0, 0.05, 50.0);
        }
        assert!(est.grade().is_none());
    }

    #[test]
    fn test_reset() {
        let mut est = GradeEstimator::new();
        drive(&mut est, 250.0, 0.04);
        est.reset();
        assert!(est.grade().is_none());
        assert_eq!(est.odometer(), 0.0);
    }
}
