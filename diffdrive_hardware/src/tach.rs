//! TIM1 as the free-running 1 MHz time base with both wheel tachometers on
//! its input-capture channels.
//!
//! The counter wraps every [`OVERFLOW_PERIOD_US`] and raises the update
//! interrupt; CH1 (left, PE9) and CH2 (right, PE11) latch the counter on a
//! rising edge and raise the capture interrupt. The registers are shared by
//! three contexts, so the timer is split into handles that each touch a
//! disjoint set of registers or status bits.

use diffdrive_control::config::OVERFLOW_PERIOD_US;
use diffdrive_control::Wheel;
use stm32f4xx_hal::{
    gpio::{Alternate, PE11, PE9},
    pac::{self, TIM1},
    rcc::Clocks,
    timer::Timer,
};

const SR_UIF: u32 = 1 << 0;
const SR_CC1IF: u32 = 1 << 1;
const SR_CC2IF: u32 = 1 << 2;
const SR_CC1OF: u32 = 1 << 9;
const SR_CC2OF: u32 = 1 << 10;

/// `ICxF = 0b0011`: fCK_INT, N = 8.
const INPUT_FILTER: u8 = 0b0011;

pub type LeftTachPin = PE9<Alternate<1>>;
pub type RightTachPin = PE11<Alternate<1>>;

fn regs() -> &'static pac::tim1::RegisterBlock {
    // SAFETY: TIM1 is moved into `TachTimer::new` and never handed out again.
    // Each handle only reads its own registers or clears its own SR bits with
    // a write (rc_w0 bits ignore ones), so concurrent use does not race.
    unsafe { &*TIM1::ptr() }
}

fn clear_flags(mask: u32) {
    regs().sr.write(|w| unsafe { w.bits(!mask & 0xFFFF) });
}

pub struct TachTimer {
    _tim: TIM1,
    _pins: (LeftTachPin, RightTachPin),
}

impl TachTimer {
    pub fn new(tim: TIM1, pins: (LeftTachPin, RightTachPin), clocks: &Clocks) -> Self {
        // Enables and resets the peripheral clock.
        let tim = Timer::new(tim, clocks).release();
        let psc = clocks.timclk2().raw() / 1_000_000 - 1;

        tim.cr1.modify(|_, w| w.cen().clear_bit());
        tim.psc.write(|w| unsafe { w.bits(psc) });
        tim.arr.write(|w| unsafe { w.bits(OVERFLOW_PERIOD_US - 1) });

        // CH1 <- TI1, CH2 <- TI2, filtered
        tim.ccmr1_input().modify(|_, w| unsafe {
            w.cc1s()
                .bits(0b01)
                .ic1f()
                .bits(INPUT_FILTER)
                .cc2s()
                .bits(0b01)
                .ic2f()
                .bits(INPUT_FILTER)
        });

        // Rising edge, capture enabled
        tim.ccer.modify(|_, w| {
            w.cc1p()
                .clear_bit()
                .cc1np()
                .clear_bit()
                .cc1e()
                .set_bit()
                .cc2p()
                .clear_bit()
                .cc2np()
                .clear_bit()
                .cc2e()
                .set_bit()
        });

        // Load PSC/ARR, then drop the flags that produced.
        tim.egr.write(|w| w.ug().set_bit());
        tim.sr.write(|w| unsafe { w.bits(0) });
        tim.cnt.write(|w| unsafe { w.bits(0) });

        tim.dier
            .modify(|_, w| w.uie().set_bit().cc1ie().set_bit().cc2ie().set_bit());

        Self { _tim: tim, _pins: pins }
    }

    /// Starts counting and hands out the per-context handles.
    pub fn start(self) -> (Overflow, Captures, Counter) {
        regs().cr1.modify(|_, w| w.cen().set_bit());
        (
            Overflow { _private: () },
            Captures { _timer: self },
            Counter { _private: () },
        )
    }
}

/// Owned by the update (overflow) interrupt.
pub struct Overflow {
    _private: (),
}

impl Overflow {
    pub fn clear(&mut self) {
        clear_flags(SR_UIF);
    }
}

/// Owned by the capture interrupt. Keeps the timer and its pins alive.
pub struct Captures {
    _timer: TachTimer,
}

impl Captures {
    /// Reads the latched counter value if `wheel`'s channel captured an edge
    /// since the last call. Reading the compare register clears the capture
    /// flag; an over-capture is reported and cleared.
    pub fn take(&mut self, wheel: Wheel) -> (Option<u16>, bool) {
        let (ccif, ccof) = match wheel {
            Wheel::Left => (SR_CC1IF, SR_CC1OF),
            Wheel::Right => (SR_CC2IF, SR_CC2OF),
        };
        let sr = regs().sr.read().bits();
        if sr & ccif == 0 {
            return (None, false);
        }

        let latch = match wheel {
            Wheel::Left => regs().ccr1().read().bits(),
            Wheel::Right => regs().ccr2().read().bits(),
        };
        let overcaptured = sr & ccof != 0;
        if overcaptured {
            clear_flags(ccof);
        }
        (Some(latch as u16), overcaptured)
    }
}

/// Read-only view of the running counter.
pub struct Counter {
    _private: (),
}

impl Counter {
    pub fn ticks(&self) -> u16 {
        regs().cnt.read().bits() as u16
    }
}
