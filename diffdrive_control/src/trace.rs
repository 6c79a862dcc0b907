//! Fixed ring of the most recent control steps, for a debugger to read.

use crate::config::TRACE_LEN;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TraceRecord {
    pub right_speed: f32,
    /// Right wheel term contributions.
    pub p: f32,
    pub i: f32,
    pub d: f32,
    pub unclamped: f32,
    pub left_speed: f32,
}

impl TraceRecord {
    pub const ZERO: TraceRecord = TraceRecord {
        right_speed: 0.0,
        p: 0.0,
        i: 0.0,
        d: 0.0,
        unclamped: 0.0,
        left_speed: 0.0,
    };
}

pub struct Trace<const N: usize = TRACE_LEN> {
    records: [TraceRecord; N],
    index: usize,
    wrapped: bool,
}

impl<const N: usize> Trace<N> {
    pub const fn new() -> Self {
        Self {
            records: [TraceRecord::ZERO; N],
            index: 0,
            wrapped: false,
        }
    }

    /// Writes at the current index and advances it, overwriting the oldest
    /// record once full.
    pub fn push(&mut self, record: TraceRecord) {
        self.records[self.index] = record;
        self.index += 1;
        if self.index >= N {
            self.index = 0;
            self.wrapped = true;
        }
    }

    /// Slot the next record goes into.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        if self.wrapped {
            N
        } else {
            self.index
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn latest(&self) -> Option<&TraceRecord> {
        if self.is_empty() {
            None
        } else {
            Some(&self.records[(self.index + N - 1) % N])
        }
    }

    pub fn oldest_first(&self) -> impl Iterator<Item = &TraceRecord> {
        let (newer, older) = self.records.split_at(self.index);
        let older = if self.wrapped { older } else { &older[..0] };
        older.iter().chain(newer.iter())
    }

    /// Raw storage in slot order, as a debugger sees it.
    pub fn as_slice(&self) -> &[TraceRecord; N] {
        &self.records
    }
}

impl<const N: usize> Default for Trace<N> {
    fn default() -> Self {
        Self::new()
    }
}
