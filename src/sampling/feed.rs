//! Sensor callback entry points

use super::averager::SampleAverager;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Averager shared between the sensor callbacks and the emitter
pub type SharedAverager = Arc<Mutex<SampleAverager>>;

/// Lock the averager, recovering the data if a holder panicked
pub fn lock_averager(averager: &Mutex<SampleAverager>) -> MutexGuard<'_, SampleAverager> {
    averager.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Receives raw readings from whatever produces them
///
/// Calls never await and hold the averager lock only for the duration of a
/// single record, so sensor callback threads are never blocked on I/O.
#[derive(Clone)]
pub struct SensorFeed {
    averager: SharedAverager,
}

impl SensorFeed {
    pub fn new(averager: SharedAverager) -> Self {
        Self { averager }
    }

    /// Raw accelerometer reading with the sensor's reported range, if known
    pub fn on_accelerometer_sample(&self, x: f32, y: f32, z: f32, range_hint: Option<f32>) {
        lock_averager(&self.averager).record_accelerometer(x, y, z, range_hint);
    }

    /// Raw magnetometer reading
    pub fn on_magnetometer_sample(&self, x: f32, y: f32, z: f32) {
        lock_averager(&self.averager).record_magnetometer(x, y, z);
    }
}
