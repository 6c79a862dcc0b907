//! Turns rising-edge latches of the time-base counter into inter-edge
//! intervals.
//!
//! A capture runs one priority above the overflow event, so it can see the
//! counter after a wrap but before `ov_count` has been bumped. In that case the
//! latch looks older than the previous one while the overflow count has not
//! moved; the channel adds one period locally. Until the overflow event
//! catches up, later edges see a snapshot one behind the stored `prev_ov` and
//! keep using `prev_ov` instead, so the same wrap is never counted twice.

use log::trace;

use crate::time_base::{Instant, TimeBase};
use crate::wheel::Wheel;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Edge {
    /// Always > 0.
    pub delta_us: u32,
    pub timestamp: Instant,
}

pub struct CaptureChannel {
    wheel: Wheel,
    prev_capture: u16,
    prev_ov: u32,
    delta_us: u32,
    edge_count: u32,
    wrap_corrections: u32,
}

impl CaptureChannel {
    pub const fn new(wheel: Wheel) -> Self {
        Self {
            wheel,
            prev_capture: 0,
            prev_ov: 0,
            delta_us: 0,
            edge_count: 0,
            wrap_corrections: 0,
        }
    }

    /// Services one capture event.
    ///
    /// `ov_snapshot` must be read before the pending flag is cleared and the
    /// latches drained. Every queued latch older than the newest is dropped,
    /// keeping the interrupt cost fixed. Returns `None` if nothing was latched.
    pub fn on_capture(
        &mut self,
        ov_snapshot: u32,
        latches: impl IntoIterator<Item = u16>,
    ) -> Option<Edge> {
        let latest = latches.into_iter().last()?;
        // A snapshot behind `prev_ov` means an earlier edge already counted a
        // wrap whose overflow event is still pending.
        let mut ov_local = if (ov_snapshot.wrapping_sub(self.prev_ov) as i32) < 0 {
            self.prev_ov
        } else {
            ov_snapshot
        };

        let raw = latest as i32 - self.prev_capture as i32;
        if raw <= 0 && ov_local == self.prev_ov {
            // Counter wrapped, overflow event not serviced yet.
            ov_local = ov_local.wrapping_add(1);
            self.wrap_corrections = self.wrap_corrections.wrapping_add(1);
            trace!("{} capture: unserviced wrap at {}", self.wheel.name(), latest);
        }

        let now = TimeBase::compose(ov_local, latest);
        let prev = TimeBase::compose(self.prev_ov, self.prev_capture);
        // ov_local >= prev_ov, and equal only when raw > 0 after correction.
        let elapsed = now.ticks().saturating_sub(prev.ticks()).max(1);
        let delta_us = u32::try_from(elapsed).unwrap_or(u32::MAX);

        self.delta_us = delta_us;
        self.edge_count = self.edge_count.wrapping_add(1);
        self.prev_capture = latest;
        self.prev_ov = ov_local;

        Some(Edge {
            delta_us,
            timestamp: now,
        })
    }

    pub fn wheel(&self) -> Wheel {
        self.wheel
    }

    pub fn delta_us(&self) -> u32 {
        self.delta_us
    }

    pub fn edge_count(&self) -> u32 {
        self.edge_count
    }

    pub fn wrap_corrections(&self) -> u32 {
        self.wrap_corrections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primed(prev_capture: u16, prev_ov: u32) -> CaptureChannel {
        let mut channel = CaptureChannel::new(Wheel::Right);
        channel.prev_capture = prev_capture;
        channel.prev_ov = prev_ov;
        channel
    }

    #[test]
    fn plain_interval() {
        let mut channel = primed(10_000, 3);
        let edge = channel.on_capture(3, [15_000]).unwrap();
        assert_eq!(edge.delta_us, 5_000);
        assert_eq!(edge.timestamp.ticks(), 3 * 50_000 + 15_000);
        assert_eq!(channel.edge_count(), 1);
        assert_eq!(channel.wrap_corrections(), 0);
    }

    #[test]
    fn unserviced_wrap_is_corrected_locally() {
        let mut channel = primed(49_000, 12);
        let edge = channel.on_capture(12, [2_000]).unwrap();
        assert_eq!(edge.delta_us, 3_000);
        assert_eq!(channel.wrap_corrections(), 1);
        assert_eq!(channel.prev_ov, 13);

        // The overflow event catches up; the next edge sees a consistent count.
        let edge = channel.on_capture(13, [7_000]).unwrap();
        assert_eq!(edge.delta_us, 5_000);
        assert_eq!(channel.wrap_corrections(), 1);
    }

    #[test]
    fn second_edge_before_overflow_event_runs() {
        let mut channel = primed(49_000, 12);
        assert_eq!(channel.on_capture(12, [2_000]).unwrap().delta_us, 3_000);

        // Overflow event still pending; the wrap is already in prev_ov.
        let edge = channel.on_capture(12, [4_000]).unwrap();
        assert_eq!(edge.delta_us, 2_000);
        assert_eq!(edge.timestamp.ticks(), 13 * 50_000 + 4_000);
        assert_eq!(channel.prev_ov, 13);

        let edge = channel.on_capture(13, [9_000]).unwrap();
        assert_eq!(edge.delta_us, 5_000);
        assert_eq!(channel.wrap_corrections(), 1);
    }

    #[test]
    fn pending_wrap_then_another_wrap() {
        let mut channel = primed(49_000, 12);
        channel.on_capture(12, [2_000]).unwrap();

        // Counter wraps again before the first overflow event was serviced.
        let edge = channel.on_capture(12, [1_000]).unwrap();
        assert_eq!(edge.delta_us, 49_000);
        assert_eq!(channel.prev_ov, 14);
        assert_eq!(channel.wrap_corrections(), 2);
    }

    #[test]
    fn serviced_wrap_uses_overflow_count() {
        let mut channel = primed(48_000, 4);
        let edge = channel.on_capture(5, [1_000]).unwrap();
        assert_eq!(edge.delta_us, 3_000);
        assert_eq!(channel.wrap_corrections(), 0);
    }

    #[test]
    fn identical_latch_counts_as_a_full_period() {
        let mut channel = primed(1_234, 0);
        let edge = channel.on_capture(0, [1_234]).unwrap();
        assert_eq!(edge.delta_us, 50_000);
    }

    #[test]
    fn keeps_only_newest_latch() {
        let mut channel = primed(0, 0);
        let edge = channel.on_capture(0, [1_000, 2_000, 6_000]).unwrap();
        assert_eq!(edge.delta_us, 6_000);
        assert_eq!(channel.edge_count(), 1);
    }

    #[test]
    fn empty_drain_is_ignored() {
        let mut channel = primed(500, 0);
        assert_eq!(channel.on_capture(0, [0u16; 0]), None);
        assert_eq!(channel.edge_count(), 0);
        assert_eq!(channel.delta_us(), 0);
    }

    #[test]
    fn long_stall_saturates() {
        let mut channel = primed(0, 0);
        let edge = channel.on_capture(100_000, [0]).unwrap();
        assert_eq!(edge.delta_us, u32::MAX);
    }
}
