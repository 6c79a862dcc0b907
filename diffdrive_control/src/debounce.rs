//! Counting debouncer for the button and switch lines sampled by the control
//! tick.
//!
//! A line's stable state follows its raw state only after the raw value has
//! matched the previous sample [`DEBOUNCE_COUNT`] times in a row.

use crate::config::{BUTTON_LINES, DEBOUNCE_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Line {
    Button1 = 0,
    Button2 = 1,
    Button3 = 2,
    Button4 = 3,
    Switch1 = 4,
    Switch2 = 5,
    Switch3 = 6,
    Switch4 = 7,
}

impl Line {
    pub const fn mask(self) -> u8 {
        1 << self as u8
    }
}

pub struct Debouncer {
    stable: u8,
    prev: u8,
    counts: [u8; BUTTON_LINES],
}

impl Debouncer {
    pub const fn new() -> Self {
        Self {
            stable: 0,
            prev: 0,
            counts: [0; BUTTON_LINES],
        }
    }

    /// `raw` has bit n set while line n reads high.
    pub fn sample(&mut self, raw: u8) {
        for (bit, count) in self.counts.iter_mut().enumerate() {
            let mask = 1u8 << bit;
            let cur = raw & mask;
            *count = if cur == self.prev & mask { *count + 1 } else { 0 };
            if *count == DEBOUNCE_COUNT {
                self.stable = (self.stable & !mask) | cur;
                *count = 0;
            }
        }
        self.prev = raw;
    }

    pub fn stable(&self) -> u8 {
        self.stable
    }

    pub fn is_pressed(&self, line: Line) -> bool {
        self.stable & line.mask() != 0
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}
