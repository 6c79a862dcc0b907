//! Speed PID emitting PWM duty words.
//!
//! The integral accumulates raw error (no `dt`; the tick period is fixed) and
//! is clamped so that its contribution stays within
//! [`INTEGRAL_OUTPUT_LIMIT`]. The output is saturated to the duty bounds, whose
//! lower end keeps the motor above its stall point.

use log::debug;

use crate::config::{
    ControlConfig, DUTY_MAX, DUTY_MIN, INTEGRAL_OUTPUT_LIMIT, KD_DIVISOR, KI_DIVISOR, KP,
};

pub struct PidCreator {
    kp: f32,
    ki: f32,
    kd: f32,
    setpoint: f32,
    duty_min: u16,
    duty_max: u16,
    integral_output_limit: f32,
}

impl Default for PidCreator {
    fn default() -> Self {
        Self {
            kp: KP,
            ki: KP / KI_DIVISOR,
            kd: KP / KD_DIVISOR,
            setpoint: 0.0,
            duty_min: DUTY_MIN,
            duty_max: DUTY_MAX,
            integral_output_limit: INTEGRAL_OUTPUT_LIMIT,
        }
    }
}

impl PidCreator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kp with Ki and Kd derived from it.
    pub fn from_kp(kp: f32) -> Self {
        Self::new()
            .set_p(kp)
            .set_i(kp / KI_DIVISOR)
            .set_d(kp / KD_DIVISOR)
    }

    pub fn from_config(config: &ControlConfig, setpoint: f32) -> Self {
        Self::from_kp(config.kp)
            .set_setpoint(setpoint)
            .set_output_limits(config.duty_min, config.duty_max)
    }

    pub fn set_p(self, p: f32) -> Self {
        let mut s = self;
        s.kp = p;
        s
    }

    pub fn set_i(self, i: f32) -> Self {
        let mut s = self;
        s.ki = i;
        s
    }

    pub fn set_d(self, d: f32) -> Self {
        let mut s = self;
        s.kd = d;
        s
    }

    pub fn set_setpoint(self, setpoint: f32) -> Self {
        let mut s = self;
        s.setpoint = setpoint;
        s
    }

    pub fn set_output_limits(self, min: u16, max: u16) -> Self {
        let mut s = self;
        s.duty_min = min;
        s.duty_max = max;
        s
    }

    pub fn create_controller(self) -> PidController {
        PidController {
            kp: self.kp,
            ki: self.ki,
            kd: self.kd,
            setpoint: self.setpoint,
            integ: 0.0,
            prev_err: 0.0,
            duty_min: self.duty_min,
            duty_max: self.duty_max,
            integral_output_limit: self.integral_output_limit,
        }
    }
}

/// Contributions of one controller step, kept for the trace.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidStep {
    pub err: f32,
    pub p: f32,
    pub i: f32,
    pub d: f32,
    /// Before saturation.
    pub unclamped: f32,
    pub duty: u16,
}

#[derive(Debug, Clone, Copy)]
pub struct PidController {
    kp: f32,
    ki: f32,
    kd: f32,
    setpoint: f32,
    integ: f32,
    prev_err: f32,
    duty_min: u16,
    duty_max: u16,
    integral_output_limit: f32,
}

impl PidController {
    pub fn update(&mut self, speed_avg: f32) -> PidStep {
        let err = self.setpoint - speed_avg;

        let limit = self.integral_limit();
        self.integ = num_traits::clamp(self.integ + err, -limit, limit);

        let p = self.kp * err;
        let i = self.ki * self.integ;
        let d = self.kd * (err - self.prev_err);
        let unclamped = p + i + d;

        // NaN lands on duty_min.
        let duty = unclamped
            .max(self.duty_min as f32)
            .min(self.duty_max as f32) as u16;

        self.prev_err = err;

        PidStep {
            err,
            p,
            i,
            d,
            unclamped,
            duty,
        }
    }

    /// Re-derives Ki and Kd from the current Kp.
    pub fn retune_from_kp(&mut self) {
        self.ki = self.kp / KI_DIVISOR;
        self.kd = self.kp / KD_DIVISOR;
    }

    pub fn set_kp(&mut self, kp: f32) {
        debug!("kp {} -> {}", self.kp, kp);
        self.kp = kp;
    }

    pub fn set_setpoint(&mut self, setpoint: f32) {
        debug!("setpoint {} -> {}", self.setpoint, setpoint);
        self.setpoint = setpoint;
    }

    /// Bound on `|integ|`.
    pub fn integral_limit(&self) -> f32 {
        self.integral_output_limit / self.ki
    }

    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    pub fn gains(&self) -> (f32, f32, f32) {
        (self.kp, self.ki, self.kd)
    }

    pub fn integral(&self) -> f32 {
        self.integ
    }

    pub fn prev_err(&self) -> f32 {
        self.prev_err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn right() -> PidController {
        PidCreator::from_kp(KP).set_setpoint(0.75).create_controller()
    }

    #[test]
    fn derived_gains() {
        let pid = right();
        assert_eq!(pid.gains(), (2500.0, 250.0, 25.0));
        assert_eq!(pid.integral_limit(), 100.0);
    }

    #[test]
    fn first_step_from_rest() {
        let mut pid = right();
        let step = pid.update(0.0);
        assert_eq!(step.err, 0.75);
        assert_eq!(step.p, 1875.0);
        assert_eq!(step.i, 187.5);
        assert_eq!(step.d, 18.75);
        assert_eq!(step.unclamped, 2081.25);
        assert_eq!(step.duty, 2081);
        assert_eq!(pid.prev_err(), 0.75);
    }

    #[test]
    fn stays_above_stall_floor() {
        let mut pid = right();
        let step = pid.update(3.0);
        assert!(step.unclamped < DUTY_MIN as f32);
        assert_eq!(step.duty, DUTY_MIN);
    }

    #[test]
    fn saturates_high_and_does_not_wind_up() {
        let mut pid = right();
        let mut ticks_to_max = None;
        for n in 0..1_000 {
            let step = pid.update(0.0);
            assert!(step.duty >= DUTY_MIN && step.duty <= DUTY_MAX);
            assert!(pid.integral().abs() <= pid.integral_limit());
            if step.duty == DUTY_MAX && ticks_to_max.is_none() {
                ticks_to_max = Some(n);
            }
        }
        assert_eq!(pid.integral(), 100.0);
        // 1875 + 250 * 0.75 * n >= 9999 first holds at n = 44 (0-based 43).
        assert_eq!(ticks_to_max, Some(43));
    }

    #[test]
    fn recovers_quickly_once_error_reverses() {
        let mut pid = right();
        for _ in 0..1_000 {
            pid.update(0.0);
        }
        // With integ pinned at 100, overshooting by 1.25 ft/s unwinds it in
        // a bounded number of ticks: 25000 - 312.5 * k < 13124.
        let mut ticks = 0;
        while pid.update(2.0).duty == DUTY_MAX {
            ticks += 1;
            assert!(ticks < 1_000);
        }
        assert_eq!(ticks + 1, 39);
    }

    #[test]
    fn nan_output_saturates_low() {
        let mut pid = right();
        let step = pid.update(f32::NAN);
        assert_eq!(step.duty, DUTY_MIN);
    }

    #[test]
    fn retune_tracks_kp() {
        let mut pid = right();
        pid.set_kp(1000.0);
        assert_eq!(pid.gains(), (1000.0, 250.0, 25.0));
        pid.retune_from_kp();
        assert_eq!(pid.gains(), (1000.0, 100.0, 10.0));
    }
}
