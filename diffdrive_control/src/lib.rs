//! Wheel-speed estimation and dual PID speed control for a two-wheeled
//! differential-drive robot.
//!
//! Nothing in here touches registers. The firmware binds these types to
//! interrupts; the traits at the edges ([`DutyRegisters`], the capture
//! iterator taken by [`WheelSensor::on_capture`]) are implemented by
//! `diffdrive_hardware`.
//!
//! | Module | Runs in |
//! | ------ | ------- |
//! | [`time_base`] | overflow interrupt (writer), everyone else (readers) |
//! | [`capture`], [`speed`], [`sensor`] | tach capture interrupt |
//! | [`pid`], [`actuator`], [`trace`], [`debounce`], [`tick`] | control tick interrupt |
//! | [`status`] | lowest priority display task |

#![cfg_attr(not(test), no_std)]

pub mod actuator;
pub mod capture;
pub mod config;
pub mod debounce;
pub mod error;
pub mod pid;
pub mod sensor;
pub mod shared;
pub mod speed;
pub mod status;
pub mod tick;
pub mod time_base;
pub mod trace;
pub mod wheel;

pub use actuator::{DutyRegisters, PwmActuator};
pub use capture::{CaptureChannel, Edge};
pub use config::ControlConfig;
pub use debounce::{Debouncer, Line};
pub use error::ConfigError;
pub use pid::{PidController, PidCreator, PidStep};
pub use sensor::WheelSensor;
pub use shared::WheelShared;
pub use speed::SpeedEstimator;
pub use tick::{ControlTick, TickReport};
pub use time_base::{Instant, OverflowCounter, TimeBase};
pub use trace::{Trace, TraceRecord};
pub use wheel::{PerWheel, Wheel};
