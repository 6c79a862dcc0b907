//! Text and figures for the status display. Runs in the lowest-priority
//! context and only reads published values.

use core::fmt::{self, Write};

use heapless::String;

use crate::config::{EDGES_PER_REV, WHEEL_CIRCUMFERENCE_FT};
use crate::shared::WheelShared;
use crate::wheel::Wheel;

/// Width of one character-LCD row.
pub const LINE_LEN: usize = 16;

pub type StatusLine = String<LINE_LEN>;

/// `fmt::Write` into a fixed buffer that keeps the leading characters once
/// the buffer fills instead of failing.
struct Truncating<'a, const N: usize> {
    buf: &'a mut String<N>,
    full: bool,
}

impl<const N: usize> Write for Truncating<'_, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.full {
                break;
            }
            self.full = self.buf.push(c).is_err();
        }
        Ok(())
    }
}

/// Appends `args` to `buf`, cutting the text where the buffer fills.
pub fn write_truncated<const N: usize>(buf: &mut String<N>, args: fmt::Arguments<'_>) {
    let mut out = Truncating { buf, full: false };
    // Truncating never reports an error; only a failing Display impl can.
    let _ = out.write_fmt(args);
}

/// `Lspeed: 0.6000` / `Rspeed: 0.7500`. Values too wide for the row are cut.
pub fn speed_line(wheel: Wheel, speed_avg: f32) -> StatusLine {
    let tag = match wheel {
        Wheel::Left => 'L',
        Wheel::Right => 'R',
    };
    let mut line = StatusLine::new();
    write_truncated(&mut line, format_args!("{tag}speed: {speed_avg:.4}"));
    line
}

/// Distance covered in whole revolutions, feet.
pub fn distance_ft(edge_count: u32) -> f32 {
    (edge_count / EDGES_PER_REV) as f32 * WHEEL_CIRCUMFERENCE_FT
}

/// Mean speed since boot, ft/s. Zero until an edge has been seen.
pub fn mean_speed(distance_ft: f32, last_edge_ms: u32) -> f32 {
    if last_edge_ms == 0 {
        0.0
    } else {
        distance_ft / (last_edge_ms as f32 / 1000.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WheelReadout {
    pub speed_avg: f32,
    pub distance_ft: f32,
    pub mean_speed: f32,
}

impl WheelReadout {
    pub fn read(shared: &WheelShared) -> Self {
        let distance_ft = distance_ft(shared.edge_count());
        Self {
            speed_avg: shared.speed_avg(),
            distance_ft,
            mean_speed: mean_speed(distance_ft, shared.last_edge_ms()),
        }
    }
}
