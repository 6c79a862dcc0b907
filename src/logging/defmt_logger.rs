use log::{Level, Record};

use super::render;

/// Forwards a `log` record to defmt over RTT.
pub(super) fn log(record: &Record) {
    let line = render(record);
    let target = record.target();
    match record.level() {
        Level::Trace => defmt::trace!("{=str}: {=str}", target, line.as_str()),
        Level::Debug => defmt::debug!("{=str}: {=str}", target, line.as_str()),
        Level::Info => defmt::info!("{=str}: {=str}", target, line.as_str()),
        Level::Warn => defmt::warn!("{=str}: {=str}", target, line.as_str()),
        Level::Error => defmt::error!("{=str}: {=str}", target, line.as_str()),
    }
}
