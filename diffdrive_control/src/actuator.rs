/// A PWM compare channel with an active and a shadow (preload) register.
pub trait DutyRegisters {
    fn write_active(&mut self, duty: u16);
    fn write_shadow(&mut self, duty: u16);
}

/// Level the direction pin is driven to for forward travel. Set at boot,
/// never changed by the speed loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ForwardLevel {
    Low,
    High,
}

pub const LEFT_FORWARD: ForwardLevel = ForwardLevel::Low;
pub const RIGHT_FORWARD: ForwardLevel = ForwardLevel::High;

pub struct PwmActuator<R: DutyRegisters> {
    registers: R,
    duty: u16,
}

impl<R: DutyRegisters> PwmActuator<R> {
    pub fn new(registers: R) -> Self {
        Self { registers, duty: 0 }
    }

    /// Writes both compare registers so the change lands glitch-free.
    pub fn apply(&mut self, duty: u16) {
        self.registers.write_active(duty);
        self.registers.write_shadow(duty);
        self.duty = duty;
    }

    /// Last duty written; zero before the first control tick.
    pub fn duty(&self) -> u16 {
        self.duty
    }

    pub fn registers(&self) -> &R {
        &self.registers
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::DutyRegisters;

    #[derive(Debug, Default)]
    pub struct MockRegisters {
        pub active: Option<u16>,
        pub shadow: Option<u16>,
        pub writes: usize,
    }

    impl DutyRegisters for MockRegisters {
        fn write_active(&mut self, duty: u16) {
            self.active = Some(duty);
            self.writes += 1;
        }

        fn write_shadow(&mut self, duty: u16) {
            self.shadow = Some(duty);
            self.writes += 1;
        }
    }
}
