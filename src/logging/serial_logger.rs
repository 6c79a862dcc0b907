use core::cell::RefCell;
use core::fmt::Write;

use critical_section::Mutex;
use diffdrive_hardware::serial::DebugSerialPort;
use log::{Level, Record};

use super::render;

static SERIAL_LOGGER: Mutex<RefCell<Option<DebugSerialPort>>> = Mutex::new(RefCell::new(None));

pub fn init(port: DebugSerialPort) {
    critical_section::with(|cs| {
        SERIAL_LOGGER.borrow(cs).replace(Some(port));
    });
}

/// Writes `level: message\r\n` to the debug UART. Blocking, so the control
/// interrupts should log sparingly.
pub(super) fn log(record: &Record) {
    let line = render(record);
    let level = match record.level() {
        Level::Trace => "trace",
        Level::Debug => "debug",
        Level::Info => "info",
        Level::Warn => "warn",
        Level::Error => "error",
    };

    critical_section::with(|cs| {
        if let Some(tx) = SERIAL_LOGGER.borrow(cs).borrow_mut().as_mut() {
            // Nowhere to report a failing debug port.
            let _ = write!(tx, "{}: {}\r\n", level, line);
        }
    });
}
