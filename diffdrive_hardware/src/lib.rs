#![no_std]

use diffdrive_control::actuator::{LEFT_FORWARD, RIGHT_FORWARD};
use diffdrive_control::config::{PWM_PERIOD, TICK_PERIOD_US};
use stm32f4xx_hal::{
    gpio::{NoPin, Output, PinState, PushPull, PB12},
    pac::{CorePeripherals, Peripherals, SPI2, TIM5},
    prelude::*,
    spi::{Mode, Phase, Polarity, Spi},
    timer::{Channel1, Channel2, CounterUs, Event, SysDelay},
};

pub mod buttons;
pub mod lcd;
pub mod led;
pub mod pwm;
pub mod serial;
pub mod tach;

use buttons::ButtonLines;
use lcd::CharLcd;
use led::{FaultLed, HeartbeatLed};
use pwm::{
    forward_state, LeftDirection, LeftPwm, MotorPwm, PwmB6, PwmB7, RightDirection, RightPwm,
};
use serial::DebugSerialPort;
use tach::TachTimer;

pub type StatusLcd = CharLcd<Spi<SPI2>, PB12<Output<PushPull>>>;
pub type ControlTimer = CounterUs<TIM5>;

pub struct RobotHardware {
    pub delay: SysDelay,
    /// Input clock of TIM2, for the status task's monotonic.
    pub mono_timer_hz: u32,

    pub heartbeat_led: HeartbeatLed,
    pub fault_led: FaultLed,

    pub dbg_serial: DebugSerialPort,
    pub lcd: StatusLcd,
    pub buttons: ButtonLines,

    pub tach: TachTimer,
    pub control_timer: ControlTimer,

    pub left_pwm: LeftPwm,
    pub right_pwm: RightPwm,
    pub left_direction: LeftDirection,
    pub right_direction: RightDirection,
}

impl RobotHardware {
    pub fn init(pac: Peripherals, core: CorePeripherals) -> Self {
        let rcc = pac.RCC.constrain();
        let clocks = rcc.cfgr.sysclk(168.MHz()).freeze();
        let delay = core.SYST.delay(&clocks);

        let gpioa = pac.GPIOA.split();
        let gpiob = pac.GPIOB.split();
        let gpiod = pac.GPIOD.split();
        let gpioe = pac.GPIOE.split();

        // Status LED's
        let heartbeat_led = gpiod.pd12.into_push_pull_output();
        let fault_led = gpiod.pd14.into_push_pull_output();

        let debug_tx_pin = gpioa.pa9.into_alternate();
        let dbg_serial = pac.USART1.tx(debug_tx_pin, 115200.bps(), &clocks).unwrap();

        let lcd_mode = Mode {
            polarity: Polarity::IdleLow,
            phase: Phase::CaptureOnFirstTransition,
        };
        let lcd_spi = pac.SPI2.spi(
            (gpiob.pb13, NoPin::new(), gpiob.pb15),
            lcd_mode,
            1.MHz(),
            &clocks,
        );
        let lcd_cs = gpiob.pb12.into_push_pull_output_in_state(PinState::High);
        let lcd = CharLcd::new(lcd_spi, lcd_cs);

        let buttons = ButtonLines::new([
            gpiod.pd0.into_pull_down_input().erase(),
            gpiod.pd1.into_pull_down_input().erase(),
            gpiod.pd2.into_pull_down_input().erase(),
            gpiod.pd3.into_pull_down_input().erase(),
            gpiod.pd4.into_pull_down_input().erase(),
            gpiod.pd5.into_pull_down_input().erase(),
            gpiod.pd6.into_pull_down_input().erase(),
            gpiod.pd7.into_pull_down_input().erase(),
        ]);

        // Direction is fixed at boot; the control loop only sets duty.
        let left_direction =
            gpiod.pd8.into_push_pull_output_in_state(forward_state(LEFT_FORWARD));
        let right_direction =
            gpiod.pd9.into_push_pull_output_in_state(forward_state(RIGHT_FORWARD));

        let (pb6, pb7): (PwmB6, PwmB7) = (gpiob.pb6.into_alternate(), gpiob.pb7.into_alternate());
        let tim4_pins = (Channel1::new(pb6), Channel2::new(pb7));
        let pwm4 = pac
            .TIM4
            .pwm_us(tim4_pins, (PWM_PERIOD as u32).micros(), &clocks);
        let (left_channel, right_channel) = pwm4.split();
        let left_pwm = MotorPwm::new(left_channel);
        let right_pwm = MotorPwm::new(right_channel);

        let tach = TachTimer::new(
            pac.TIM1,
            (gpioe.pe9.into_alternate(), gpioe.pe11.into_alternate()),
            &clocks,
        );

        let mut control_timer = pac.TIM5.counter_us(&clocks);
        control_timer.start(TICK_PERIOD_US).unwrap();
        control_timer.listen(Event::Update);

        Self {
            delay,
            mono_timer_hz: clocks.timclk1().raw(),
            heartbeat_led,
            fault_led,
            dbg_serial,
            lcd,
            buttons,
            tach,
            control_timer,
            left_pwm,
            right_pwm,
            left_direction,
            right_direction,
        }
    }
}
