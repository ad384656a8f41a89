//! Synthetic motion source for hosts without motion sensors

use super::feed::SensorFeed;
use std::f32::consts::TAU;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Reported accelerometer range (2 g)
const ACCEL_RANGE: f32 = 19.6133;

/// Drives a [`SensorFeed`] with slow sinusoids
pub struct SimulatedSensor {
    feed: SensorFeed,
    rate_hz: u32,
}

impl SimulatedSensor {
    pub fn new(feed: SensorFeed, rate_hz: u32) -> Self {
        Self {
            feed,
            rate_hz: rate_hz.max(1),
        }
    }

    /// Reading at time `t` seconds: accelerometer then magnetometer
    pub fn reading(t: f32) -> ([f32; 3], [f32; 3]) {
        let phase = TAU * 0.5 * t;
        let accel = [
            4.0 * phase.sin(),
            4.0 * phase.cos(),
            9.81 + 0.5 * (3.0 * phase).sin(),
        ];
        let mag = [30.0 * phase.cos(), 30.0 * phase.sin(), -42.0];
        (accel, mag)
    }

    /// Produce samples until cancelled
    pub async fn run(self, cancel: CancellationToken) {
        let period = Duration::from_micros(1_000_000 / self.rate_hz as u64);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("[SENSOR] Simulated sensor at {} Hz", self.rate_hz);

        let mut step: u64 = 0;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let t = step as f32 / self.rate_hz as f32;
            let (accel, mag) = Self::reading(t);
            self.feed
                .on_accelerometer_sample(accel[0], accel[1], accel[2], Some(ACCEL_RANGE));
            self.feed.on_magnetometer_sample(mag[0], mag[1], mag[2]);
            step = step.wrapping_add(1);
        }

        info!("[SENSOR] Simulated sensor stopped");
    }
}
