use stm32f4xx_hal::gpio::{Output, PushPull, PD12, PD14};

/// Toggled by the status task while the firmware is alive.
pub type HeartbeatLed = PD12<Output<PushPull>>;
/// Lit when the status display stops responding.
pub type FaultLed = PD14<Output<PushPull>>;
