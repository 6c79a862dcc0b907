#[cfg(feature = "defmt_logger")]
pub mod defmt_logger;

#[cfg(feature = "serial_logger")]
pub mod serial_logger;

use core::sync::atomic::{AtomicUsize, Ordering};

use diffdrive_control::status::write_truncated;
pub use log::Level;
use log::{Metadata, Record};

/// Longest rendered message; the rest is cut.
pub(crate) const LINE_CAPACITY: usize = 96;

pub(crate) type LogLine = heapless::String<LINE_CAPACITY>;

/// Renders `record` into a fixed buffer. A full buffer truncates.
pub(crate) fn render(record: &Record) -> LogLine {
    let mut line = LogLine::new();
    write_truncated(&mut line, *record.args());
    line
}

struct LoggerType;

static LOGGER: LoggerType = LoggerType;
static LEVEL: AtomicUsize = AtomicUsize::new(Level::Debug as usize);

fn level() -> Level {
    match LEVEL.load(Ordering::Relaxed) {
        1 => Level::Error,
        2 => Level::Warn,
        3 => Level::Info,
        4 => Level::Debug,
        _ => Level::Trace,
    }
}

pub fn init(level: Level) {
    LEVEL.store(level as usize, Ordering::Relaxed);
    // Only fails if a logger is already installed, which is harmless.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level.to_level_filter());
}

impl log::Log for LoggerType {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            #[cfg(feature = "defmt_logger")]
            defmt_logger::log(record);

            #[cfg(feature = "serial_logger")]
            serial_logger::log(record);
        }
    }

    fn flush(&self) {}
}
