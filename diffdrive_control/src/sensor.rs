use crate::capture::CaptureChannel;
use crate::config::ControlConfig;
use crate::shared::WheelShared;
use crate::speed::SpeedEstimator;
use crate::wheel::Wheel;

/// Everything a wheel's capture interrupt owns: the capture bookkeeping, the
/// estimator, and the handle it publishes through.
pub struct WheelSensor<'a> {
    channel: CaptureChannel,
    estimator: SpeedEstimator,
    shared: &'a WheelShared,
}

impl<'a> WheelSensor<'a> {
    pub fn new(wheel: Wheel, config: &ControlConfig, shared: &'a WheelShared) -> Self {
        Self {
            channel: CaptureChannel::new(wheel),
            estimator: SpeedEstimator::from_config(config),
            shared,
        }
    }

    /// Returns the new smoothed speed, or `None` if no latch was pending.
    pub fn on_capture(
        &mut self,
        ov_snapshot: u32,
        latches: impl IntoIterator<Item = u16>,
    ) -> Option<f32> {
        let edge = self.channel.on_capture(ov_snapshot, latches)?;
        let speed_avg = self.estimator.update(edge.delta_us);
        let last_edge_ms = u32::try_from(edge.timestamp.duration_since_epoch().to_millis())
            .unwrap_or(u32::MAX);
        self.shared
            .publish(speed_avg, self.channel.edge_count(), last_edge_ms);
        Some(speed_avg)
    }

    pub fn channel(&self) -> &CaptureChannel {
        &self.channel
    }

    pub fn estimator(&self) -> &SpeedEstimator {
        &self.estimator
    }
}
