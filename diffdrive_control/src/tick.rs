//! The periodic control step. Runs at the highest interrupt priority, so
//! nothing it owns is ever observed half-updated.

use crate::actuator::{DutyRegisters, PwmActuator};
use crate::config::ControlConfig;
use crate::debounce::Debouncer;
use crate::pid::{PidController, PidCreator, PidStep};
use crate::trace::{Trace, TraceRecord};
use crate::wheel::{PerWheel, Wheel};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    pub right: PidStep,
    pub left: PidStep,
}

pub struct ControlTick {
    pids: PerWheel<PidController>,
    trace: Trace,
    debouncer: Debouncer,
    ticks: u32,
}

impl ControlTick {
    pub fn new(config: &ControlConfig) -> Self {
        Self {
            pids: PerWheel::new(
                PidCreator::from_config(config, config.setpoint_left).create_controller(),
                PidCreator::from_config(config, config.setpoint_right).create_controller(),
            ),
            trace: Trace::new(),
            debouncer: Debouncer::new(),
            ticks: 0,
        }
    }

    /// `speeds` is a by-value snapshot of each wheel's smoothed speed.
    pub fn run<L: DutyRegisters, R: DutyRegisters>(
        &mut self,
        speeds: PerWheel<f32>,
        left: &mut PwmActuator<L>,
        right: &mut PwmActuator<R>,
        buttons: u8,
    ) -> TickReport {
        // Lets a debugger retune with Kp alone.
        self.pids.right.retune_from_kp();
        self.pids.left.retune_from_kp();

        let right_step = self.pids.right.update(speeds.right);
        right.apply(right_step.duty);

        let left_step = self.pids.left.update(speeds.left);
        left.apply(left_step.duty);

        self.debouncer.sample(buttons);

        self.trace.push(TraceRecord {
            right_speed: speeds.right,
            p: right_step.p,
            i: right_step.i,
            d: right_step.d,
            unclamped: right_step.unclamped,
            left_speed: speeds.left,
        });
        self.ticks = self.ticks.wrapping_add(1);

        TickReport {
            right: right_step,
            left: left_step,
        }
    }

    pub fn set_setpoint(&mut self, wheel: Wheel, setpoint: f32) {
        self.pids[wheel].set_setpoint(setpoint);
    }

    /// Ki and Kd follow on the next tick.
    pub fn set_kp(&mut self, kp: f32) {
        for wheel in Wheel::ALL {
            self.pids[wheel].set_kp(kp);
        }
    }

    pub fn pid(&self, wheel: Wheel) -> &PidController {
        &self.pids[wheel]
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn buttons(&self) -> &Debouncer {
        &self.debouncer
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::mock::MockRegisters;
    use crate::config::{DUTY_MAX, DUTY_MIN, TRACE_LEN};
    use crate::debounce::Line;

    struct Rig {
        tick: ControlTick,
        left: PwmActuator<MockRegisters>,
        right: PwmActuator<MockRegisters>,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                tick: ControlTick::new(&ControlConfig::default()),
                left: PwmActuator::new(MockRegisters::default()),
                right: PwmActuator::new(MockRegisters::default()),
            }
        }

        fn run(&mut self, left: f32, right: f32) -> TickReport {
            self.tick
                .run(PerWheel::new(left, right), &mut self.left, &mut self.right, 0)
        }
    }

    #[test]
    fn cold_start_writes_both_registers_of_both_wheels() {
        let mut rig = Rig::new();
        let report = rig.run(0.0, 0.0);

        assert!((report.left.unclamped - 1665.0).abs() < 1e-2);
        assert_eq!(report.left.duty, 1665);
        assert_eq!(report.right.unclamped, 2081.25);
        assert_eq!(report.right.duty, 2081);

        assert_eq!(rig.left.registers().active, Some(1665));
        assert_eq!(rig.left.registers().shadow, Some(1665));
        assert_eq!(rig.right.registers().active, Some(2081));
        assert_eq!(rig.right.registers().shadow, Some(2081));
    }

    #[test]
    fn trace_records_right_terms_and_both_speeds() {
        let mut rig = Rig::new();
        rig.run(0.25, 0.5);
        let record = rig.tick.trace().latest().copied().unwrap();
        let pid = rig.tick.pid(Wheel::Right);
        assert_eq!(record.right_speed, 0.5);
        assert_eq!(record.left_speed, 0.25);
        assert_eq!(record.p, 2500.0 * 0.25);
        assert_eq!(record.i, 250.0 * pid.integral());
        assert_eq!(record.d, 25.0 * 0.25);
        assert_eq!(record.unclamped, record.p + record.i + record.d);
    }

    #[test]
    fn trace_index_wraps() {
        let mut rig = Rig::new();
        for _ in 0..TRACE_LEN + 3 {
            rig.run(0.6, 0.75);
        }
        assert_eq!(rig.tick.trace().index(), 3);
        assert_eq!(rig.tick.ticks(), TRACE_LEN as u32 + 3);
    }

    #[test]
    fn kp_change_rederives_other_gains_on_next_tick() {
        let mut rig = Rig::new();
        rig.tick.set_kp(5000.0);
        assert_eq!(rig.tick.pid(Wheel::Left).gains().1, 250.0);
        rig.run(0.0, 0.0);
        assert_eq!(rig.tick.pid(Wheel::Left).gains(), (5000.0, 500.0, 50.0));
        assert_eq!(rig.tick.pid(Wheel::Right).gains(), (5000.0, 500.0, 50.0));
    }

    #[test]
    fn duty_always_within_bounds() {
        let mut rig = Rig::new();
        let speeds = [0.0, 5.0, 0.7, 0.0, 12.0, 0.6, 0.75, -1.0];
        for n in 0..400 {
            let s = speeds[n % speeds.len()];
            let report = rig.run(s, s * 0.5);
            for step in [report.left, report.right] {
                assert!(step.duty >= DUTY_MIN && step.duty <= DUTY_MAX);
            }
            for wheel in Wheel::ALL {
                let pid = rig.tick.pid(wheel);
                assert!(pid.integral().abs() <= pid.integral_limit());
            }
        }
    }

    #[test]
    fn samples_buttons_each_tick() {
        let mut rig = Rig::new();
        for _ in 0..11 {
            rig.tick.run(
                PerWheel::new(0.0, 0.0),
                &mut rig.left,
                &mut rig.right,
                Line::Button3.mask(),
            );
        }
        assert!(rig.tick.buttons().is_pressed(Line::Button3));
    }
}
