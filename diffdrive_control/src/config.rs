//! Compile-time tunables for the speed loop.
//!
//! Defaults are the values the robot was tuned with. [`ControlConfig`] gathers
//! the ones a bring-up might change and is checked once at boot.

use fugit::{MicrosDurationU32, MillisDurationU32};

use crate::error::ConfigError;

/// Hardware time-base period, in counts (1 count = 1 µs).
pub const OVERFLOW_PERIOD_US: u32 = 50_000;

/// PWM period in timer counts. Duty words are compare values in `0..PWM_PERIOD`.
pub const PWM_PERIOD: u16 = 10_000;

pub const SETPOINT_LEFT_FPS: f32 = 0.60;
pub const SETPOINT_RIGHT_FPS: f32 = 0.75;

pub const KP: f32 = 2500.0;
pub const KI_DIVISOR: f32 = 10.0;
pub const KD_DIVISOR: f32 = 100.0;

/// The integral accumulator is bounded so that `Ki * integ` stays within this.
pub const INTEGRAL_OUTPUT_LIMIT: f32 = 25_000.0;

/// Weight of the newest sample in the speed filter.
pub const ALPHA: f32 = 0.1;

/// Intervals at or below this are glitches, not motion.
pub const MIN_DT_US: u32 = 500;

/// Speed reported for a glitch interval.
pub const GLITCH_SPEED_FPS: f32 = 2.0;

/// `speed = SPEED_NUMERATOR / dt_us`. Calibrated at runtime; it does not match
/// `WHEEL_CIRCUMFERENCE_FT / EDGES_PER_REV * 1e6` (about 4493), which would
/// imply ~144 edges per revolution instead of 160. Kept as observed.
pub const SPEED_NUMERATOR: f32 = 5000.0;

pub const WHEEL_CIRCUMFERENCE_FT: f32 = 0.71886;
pub const EDGES_PER_REV: u32 = 160;

pub const DUTY_MIN: u16 = 800;
pub const DUTY_MAX: u16 = 9999;

pub const TICK_PERIOD: MillisDurationU32 = MillisDurationU32::from_ticks(23);
pub const TICK_PERIOD_US: MicrosDurationU32 = MicrosDurationU32::from_ticks(23_000);

pub const TRACE_LEN: usize = 500;

pub const BUTTON_LINES: usize = 8;
/// Consecutive identical samples before a line's debounced state flips.
pub const DEBOUNCE_COUNT: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlConfig {
    pub setpoint_left: f32,
    pub setpoint_right: f32,
    pub kp: f32,
    pub alpha: f32,
    pub min_dt_us: u32,
    pub duty_min: u16,
    pub duty_max: u16,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            setpoint_left: SETPOINT_LEFT_FPS,
            setpoint_right: SETPOINT_RIGHT_FPS,
            kp: KP,
            alpha: ALPHA,
            min_dt_us: MIN_DT_US,
            duty_min: DUTY_MIN,
            duty_max: DUTY_MAX,
        }
    }
}

impl ControlConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Ki is derived from Kp and divides the integral limit.
        if !self.kp.is_finite() || self.kp <= 0.0 {
            return Err(ConfigError::InvalidGain(self.kp));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(ConfigError::InvalidAlpha(self.alpha));
        }
        if self.duty_min > self.duty_max {
            return Err(ConfigError::InvertedDutyBounds {
                min: self.duty_min,
                max: self.duty_max,
            });
        }
        if self.duty_max >= PWM_PERIOD {
            return Err(ConfigError::DutyBeyondPeriod(self.duty_max));
        }
        if !self.setpoint_left.is_finite() || !self.setpoint_right.is_finite() {
            return Err(ConfigError::InvalidSetpoint);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(ControlConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_gain() {
        let config = ControlConfig {
            kp: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidGain(0.0)));
    }

    #[test]
    fn rejects_alpha_out_of_range() {
        for alpha in [0.0, -0.1, 1.5, f32::NAN] {
            let config = ControlConfig {
                alpha,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidAlpha(_))
            ));
        }
    }

    #[test]
    fn rejects_bad_duty_bounds() {
        let inverted = ControlConfig {
            duty_min: 5000,
            duty_max: 4000,
            ..Default::default()
        };
        assert_eq!(
            inverted.validate(),
            Err(ConfigError::InvertedDutyBounds {
                min: 5000,
                max: 4000
            })
        );

        let too_wide = ControlConfig {
            duty_max: PWM_PERIOD,
            ..Default::default()
        };
        assert_eq!(
            too_wide.validate(),
            Err(ConfigError::DutyBeyondPeriod(PWM_PERIOD))
        );
    }

    #[test]
    fn tick_period_matches_in_both_units() {
        assert_eq!(TICK_PERIOD.to_micros(), TICK_PERIOD_US.ticks());
    }
}
