#![no_std]
#![no_main]

mod logging;

use core::sync::atomic::{AtomicU32, Ordering};

use diffdrive_control::{OverflowCounter, PerWheel, WheelShared};

#[cfg(feature = "defmt_logger")]
use {defmt_rtt as _, panic_probe as _};

#[cfg(all(feature = "serial_logger", not(feature = "defmt_logger")))]
use panic_halt as _;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Time-base wraps. Written only by the overflow interrupt.
static OVERFLOWS: OverflowCounter = OverflowCounter::new();

/// Per-wheel speed and odometry. Written only by the capture interrupt.
static WHEELS: PerWheel<WheelShared> = PerWheel::new(WheelShared::new(), WheelShared::new());

/// Edges the capture unit overwrote before they were read.
static OVERCAPTURES: AtomicU32 = AtomicU32::new(0);

#[rtic::app(device = stm32f4xx_hal::pac, dispatchers = [USART3])]
mod app {
    use super::*;

    use diffdrive_control::config::TICK_PERIOD;
    use diffdrive_control::status::{speed_line, WheelReadout};
    use diffdrive_control::{
        ControlConfig, ControlTick, PwmActuator, TimeBase, Wheel, WheelSensor,
    };
    use diffdrive_hardware::{
        buttons::ButtonLines,
        led::{FaultLed, HeartbeatLed},
        pwm::{LeftDirection, LeftPwm, RightDirection, RightPwm},
        tach::{Captures, Counter, Overflow},
        ControlTimer, RobotHardware, StatusLcd,
    };
    use fugit::ExtU64;
    use log::{error, info, warn};
    use rtic_monotonics::stm32::Tim2;
    use stm32f4xx_hal::{prelude::*, timer::Flag};

    const STATUS_PERIOD_MS: u64 = 250;

    pub struct Actuators {
        pub left: PwmActuator<LeftPwm>,
        pub right: PwmActuator<RightPwm>,
        _left_direction: LeftDirection,
        _right_direction: RightDirection,
    }

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        overflow: Overflow,
        captures: Captures,
        sensors: PerWheel<WheelSensor<'static>>,
        control_timer: ControlTimer,
        control: ControlTick,
        actuators: Actuators,
        buttons: ButtonLines,
        counter: Counter,
        lcd: StatusLcd,
        heartbeat_led: HeartbeatLed,
        fault_led: FaultLed,
    }

    #[init]
    fn init(ctx: init::Context) -> (Shared, Local) {
        // set DBGMCU to allow wfi in idle function while using defmt
        ctx.device.DBGMCU.cr.modify(|_, w| {
            w.dbg_sleep().set_bit();
            w.dbg_standby().set_bit();
            w.dbg_stop().set_bit()
        });
        // enabling the dma1 clock keeps one AHB bus master active, which prevents SRAM from reading as 0's
        // https://github.com/probe-rs/probe-rs/issues/350#issuecomment-740550519
        ctx.device.RCC.ahb1enr.modify(|_, w| w.dma1en().enabled());

        let mut hw = RobotHardware::init(ctx.device, ctx.core);

        #[cfg(feature = "serial_logger")]
        logging::serial_logger::init(hw.dbg_serial);
        logging::init(logging::Level::Info);

        info!("{} v{}", NAME, VERSION);

        let config = ControlConfig::default();
        if let Err(e) = config.validate() {
            panic!("invalid control config: {}", e);
        }
        info!(
            "setpoints L {} R {} ft/s, kp {}, alpha {}, duty {}..{}",
            config.setpoint_left,
            config.setpoint_right,
            config.kp,
            config.alpha,
            config.duty_min,
            config.duty_max
        );
        info!(
            "control tick {} ms, pwm period {} ticks",
            TICK_PERIOD.ticks(),
            hw.left_pwm.max_duty()
        );

        // The LCD module needs a moment after power-up before it takes commands.
        hw.delay.delay(100_u32.millis());
        if let Err(e) = hw.lcd.setup() {
            error!("lcd setup failed: {:?}", e);
            hw.fault_led.set_high();
        }

        let sensors = PerWheel::from_fn(|wheel| WheelSensor::new(wheel, &config, &WHEELS[wheel]));
        let control = ControlTick::new(&config);

        let actuators = Actuators {
            left: PwmActuator::new(hw.left_pwm),
            right: PwmActuator::new(hw.right_pwm),
            _left_direction: hw.left_direction,
            _right_direction: hw.right_direction,
        };

        let (overflow, captures, counter) = hw.tach.start();

        let token = rtic_monotonics::create_stm32_tim2_monotonic_token!();
        Tim2::start(hw.mono_timer_hz, token);

        status::spawn().ok();

        (
            Shared {},
            Local {
                overflow,
                captures,
                sensors,
                control_timer: hw.control_timer,
                control,
                actuators,
                buttons: hw.buttons,
                counter,
                lcd: hw.lcd,
                heartbeat_led: hw.heartbeat_led,
                fault_led: hw.fault_led,
            },
        )
    }

    #[idle]
    fn idle(_: idle::Context) -> ! {
        loop {
            rtic::export::wfi();
        }
    }

    /// Time-base wrap. Runs below the capture interrupt, so a capture may
    /// observe a wrap that has not been counted yet.
    #[task(binds = TIM1_UP_TIM10, priority = 5, local = [overflow])]
    fn overflow(ctx: overflow::Context) {
        ctx.local.overflow.clear();
        OVERFLOWS.increment();
    }

    #[task(binds = TIM1_CC, priority = 6, local = [captures, sensors])]
    fn tach_capture(ctx: tach_capture::Context) {
        let ov = OVERFLOWS.get();
        for wheel in Wheel::ALL {
            let (latch, overcaptured) = ctx.local.captures.take(wheel);
            if overcaptured {
                OVERCAPTURES.fetch_add(1, Ordering::Relaxed);
            }
            ctx.local.sensors[wheel].on_capture(ov, latch);
        }
    }

    #[task(binds = TIM5, priority = 7, local = [control_timer, control, actuators, buttons])]
    fn control_tick(ctx: control_tick::Context) {
        ctx.local.control_timer.clear_flags(Flag::Update);

        let speeds = PerWheel::new(WHEELS.left.speed_avg(), WHEELS.right.speed_avg());
        let raw_buttons = ctx.local.buttons.sample();
        let actuators = ctx.local.actuators;
        ctx.local
            .control
            .run(speeds, &mut actuators.left, &mut actuators.right, raw_buttons);
    }

    #[task(priority = 1, local = [counter, lcd, heartbeat_led, fault_led])]
    async fn status(ctx: status::Context) {
        let time_base = TimeBase::new(&OVERFLOWS);
        let mut reported_overcaptures = 0;

        loop {
            let left = WheelReadout::read(&WHEELS.left);
            let right = WheelReadout::read(&WHEELS.right);

            let rows = [
                speed_line(Wheel::Left, left.speed_avg),
                speed_line(Wheel::Right, right.speed_avg),
            ];
            for (row, text) in (0_u8..).zip(rows.iter()) {
                if let Err(e) = ctx.local.lcd.write_row(row, text) {
                    warn!("lcd write failed: {:?}", e);
                    ctx.local.fault_led.set_high();
                }
            }

            let now = time_base.now(|| ctx.local.counter.ticks());
            info!(
                "t={}ms L {} ft {} ft/s, R {} ft {} ft/s",
                now.duration_since_epoch().to_millis(),
                left.distance_ft,
                left.mean_speed,
                right.distance_ft,
                right.mean_speed
            );

            let overcaptures = OVERCAPTURES.load(Ordering::Relaxed);
            if overcaptures != reported_overcaptures {
                warn!("{} tach edges lost to over-capture", overcaptures);
                reported_overcaptures = overcaptures;
            }

            ctx.local.heartbeat_led.toggle();
            Tim2::delay(STATUS_PERIOD_MS.millis()).await;
        }
    }
}
