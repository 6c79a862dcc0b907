//! Per-wheel values published by a capture interrupt and read by
//! higher-priority (control tick) and lower-priority (status) contexts.
//!
//! Each field is a single word with one writer, so no lock is taken. A reader
//! sees either the value before or after an update, never a mix.

use core::sync::atomic::{AtomicU32, Ordering};

use atomic_float::AtomicF32;

pub struct WheelShared {
    speed_avg: AtomicF32,
    edge_count: AtomicU32,
    last_edge_ms: AtomicU32,
}

impl WheelShared {
    pub const fn new() -> Self {
        Self {
            speed_avg: AtomicF32::new(0.0),
            edge_count: AtomicU32::new(0),
            last_edge_ms: AtomicU32::new(0),
        }
    }

    /// Capture interrupt of the owning wheel only.
    pub fn publish(&self, speed_avg: f32, edge_count: u32, last_edge_ms: u32) {
        self.speed_avg.store(speed_avg, Ordering::Relaxed);
        self.edge_count.store(edge_count, Ordering::Relaxed);
        self.last_edge_ms.store(last_edge_ms, Ordering::Relaxed);
    }

    pub fn speed_avg(&self) -> f32 {
        self.speed_avg.load(Ordering::Relaxed)
    }

    pub fn edge_count(&self) -> u32 {
        self.edge_count.load(Ordering::Relaxed)
    }

    pub fn last_edge_ms(&self) -> u32 {
        self.last_edge_ms.load(Ordering::Relaxed)
    }
}

impl Default for WheelShared {
    fn default() -> Self {
        Self::new()
    }
}
