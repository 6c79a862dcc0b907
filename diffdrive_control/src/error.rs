use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    InvalidGain(f32),
    InvalidAlpha(f32),
    InvertedDutyBounds { min: u16, max: u16 },
    DutyBeyondPeriod(u16),
    InvalidSetpoint,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidGain(kp) => write!(f, "proportional gain must be positive, got {kp}"),
            ConfigError::InvalidAlpha(a) => write!(f, "smoothing coefficient must be in (0, 1], got {a}"),
            ConfigError::InvertedDutyBounds { min, max } => {
                write!(f, "duty bounds inverted: min {min} > max {max}")
            }
            ConfigError::DutyBeyondPeriod(max) => {
                write!(f, "duty max {max} does not fit the PWM period")
            }
            ConfigError::InvalidSetpoint => f.write_str("set-point must be finite"),
        }
    }
}
