use diffdrive_control::actuator::ForwardLevel;
use diffdrive_control::DutyRegisters;
use stm32f4xx_hal::{
    gpio::{Alternate, Output, Pin, PinState, PushPull, PD8, PD9},
    pac::TIM4,
    timer::PwmChannel,
};

pub type PwmB6 = Pin<'B', 6_u8, Alternate<2>>;
pub type PwmB7 = Pin<'B', 7_u8, Alternate<2>>;

pub type LeftDirection = PD8<Output<PushPull>>;
pub type RightDirection = PD9<Output<PushPull>>;

pub type LeftPwm = MotorPwm<0>;
pub type RightPwm = MotorPwm<1>;

pub(crate) fn forward_state(level: ForwardLevel) -> PinState {
    match level {
        ForwardLevel::Low => PinState::Low,
        ForwardLevel::High => PinState::High,
    }
}

/// One TIM4 compare channel driving a motor's enable input.
///
/// The HAL runs the compare registers with preload enabled: a write to
/// CCRx lands in the shadow copy and the counter picks it up as the active
/// compare value at the next update event.
pub struct MotorPwm<const C: u8> {
    channel: PwmChannel<TIM4, C>,
}

impl<const C: u8> MotorPwm<C> {
    pub fn new(mut channel: PwmChannel<TIM4, C>) -> Self {
        channel.set_duty(0);
        channel.enable();
        Self { channel }
    }

    pub fn max_duty(&self) -> u16 {
        self.channel.get_max_duty()
    }
}

impl<const C: u8> DutyRegisters for MotorPwm<C> {
    fn write_active(&mut self, _duty: u16) {
        // Latched from the preload register by hardware.
    }

    fn write_shadow(&mut self, duty: u16) {
        self.channel.set_duty(duty);
    }
}
