use stm32f4xx_hal::gpio::{ErasedPin, Input};

use diffdrive_control::config::BUTTON_LINES;

/// PD0..PD3 push buttons, PD4..PD7 slide switches, all pulled down.
pub struct ButtonLines {
    lines: [ErasedPin<Input>; BUTTON_LINES],
}

impl ButtonLines {
    pub fn new(lines: [ErasedPin<Input>; BUTTON_LINES]) -> Self {
        Self { lines }
    }

    /// Raw level of every line, bit `n` for line `n`.
    pub fn sample(&self) -> u8 {
        self.lines
            .iter()
            .enumerate()
            .fold(0, |mask, (n, line)| {
                if line.is_high() {
                    mask | (1 << n)
                } else {
                    mask
                }
            })
    }
}
