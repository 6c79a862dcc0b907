use log::trace;

use crate::config::{ControlConfig, GLITCH_SPEED_FPS, SPEED_NUMERATOR};

/// Per-edge speed estimate with first-order exponential smoothing.
///
/// `speed_avg` is always a convex combination of the past instantaneous
/// samples (and the initial zero).
#[derive(Debug, Clone, Copy)]
pub struct SpeedEstimator {
    speed_inst: f32,
    speed_avg: f32,
    alpha: f32,
    min_dt_us: u32,
}

impl SpeedEstimator {
    pub const fn new(alpha: f32, min_dt_us: u32) -> Self {
        Self {
            speed_inst: 0.0,
            speed_avg: 0.0,
            alpha,
            min_dt_us,
        }
    }

    pub fn from_config(config: &ControlConfig) -> Self {
        Self::new(config.alpha, config.min_dt_us)
    }

    /// Feeds one inter-edge interval and returns the new smoothed speed, ft/s.
    pub fn update(&mut self, delta_us: u32) -> f32 {
        self.speed_inst = if delta_us > self.min_dt_us {
            SPEED_NUMERATOR / delta_us as f32
        } else {
            trace!("glitch interval {} us", delta_us);
            GLITCH_SPEED_FPS
        };
        self.speed_avg = self.alpha * self.speed_inst + (1.0 - self.alpha) * self.speed_avg;
        self.speed_avg
    }

    pub fn speed_inst(&self) -> f32 {
        self.speed_inst
    }

    pub fn speed_avg(&self) -> f32 {
        self.speed_avg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ALPHA, MIN_DT_US};

    fn close(a: f32, b: f32, tol: f32) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn constant_train_converges_to_one_foot_per_second() {
        let mut est = SpeedEstimator::new(ALPHA, MIN_DT_US);
        est.update(5_000);
        assert_eq!(est.speed_inst(), 1.0);
        assert!(close(est.speed_avg(), 0.1, 1e-6));

        for _ in 0..200 {
            est.update(5_000);
        }
        assert!(close(est.speed_avg(), 1.0, 1e-4));
    }

    #[test]
    fn boundary_interval_is_a_glitch() {
        let mut est = SpeedEstimator::new(ALPHA, MIN_DT_US);
        est.update(500);
        assert_eq!(est.speed_inst(), GLITCH_SPEED_FPS);

        est.update(501);
        assert!(close(est.speed_inst(), 9.98004, 1e-4));
    }

    #[test]
    fn glitch_burst_tracks_towards_clamp() {
        let mut est = SpeedEstimator::new(ALPHA, MIN_DT_US);
        let mut prev = est.speed_avg();
        for _ in 0..3 {
            let avg = est.update(200);
            assert_eq!(est.speed_inst(), 2.0);
            assert!(avg > prev && avg < 2.0);
            prev = avg;
        }
        assert!(close(prev, 2.0 * (1.0 - 0.9f32.powi(3)), 1e-5));
    }

    #[test]
    fn average_stays_within_sample_range() {
        let mut est = SpeedEstimator::new(ALPHA, MIN_DT_US);
        let intervals = [5_000, 8_000, 3_000, 12_000, 700, 100, 40_000];
        let mut hi = 0.0f32;
        for dt in intervals {
            let avg = est.update(dt);
            hi = hi.max(est.speed_inst());
            assert!(avg >= 0.0 && avg <= hi);
        }
    }
}
