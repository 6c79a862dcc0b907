//! Free-running microsecond clock built from a 16-bit hardware counter that
//! wraps every [`OVERFLOW_PERIOD_US`] and a 32-bit software wrap count.
//!
//! `ov_count` has exactly one writer, the overflow interrupt. Readers running
//! below the overflow priority must use [`TimeBase::now`], which retries when a
//! wrap lands between its reads. Readers at or above the overflow priority may
//! read the pair once with [`TimeBase::compose`].

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::OVERFLOW_PERIOD_US;

pub type Instant = fugit::TimerInstantU64<1_000_000>;

pub struct OverflowCounter {
    count: AtomicU32,
}

impl OverflowCounter {
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Only the overflow interrupt may call this.
    pub fn increment(&self) {
        // Single writer, so load + store needs no read-modify-write support.
        let next = self.count.load(Ordering::Relaxed).wrapping_add(1);
        self.count.store(next, Ordering::Release);
    }

    pub fn get(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }
}

impl Default for OverflowCounter {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TimeBase<'a> {
    overflows: &'a OverflowCounter,
}

impl<'a> TimeBase<'a> {
    pub const fn new(overflows: &'a OverflowCounter) -> Self {
        Self { overflows }
    }

    pub fn overflows(&self) -> u32 {
        self.overflows.get()
    }

    pub fn compose(ov_count: u32, tick_hw: u16) -> Instant {
        Instant::from_ticks(ov_count as u64 * OVERFLOW_PERIOD_US as u64 + tick_hw as u64)
    }

    /// Torn-read-safe composite time. `read_tick` returns the hardware counter.
    pub fn now(&self, mut read_tick: impl FnMut() -> u16) -> Instant {
        loop {
            let before = self.overflows.get();
            let tick = read_tick();
            let after = self.overflows.get();
            if before == after {
                return Self::compose(before, tick);
            }
        }
    }
}
