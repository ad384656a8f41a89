//! Ring-buffer averaging of accelerometer samples
//!
//! Sensor callbacks arrive at irregular intervals; the averager collects
//! them into a window of raw frames and produces one averaged frame per
//! emitter tick. Only the accelerometer is averaged. The magnetometer keeps
//! its most recent normalized reading.

use super::normalize::{Normalization, Normalizer, ACCEL_SPAN, MAG_SPAN};
use edroid_shared::limits::MAX_WINDOW;
use edroid_shared::Frame;
use tracing::debug;

/// Averager behaviour that does not change during a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AveragerConfig {
    /// Scaling strategy for raw float readings
    pub normalization: Normalization,
    /// Require a fresh magnetometer sample before advancing the window
    pub track_magnetometer: bool,
}

impl Default for AveragerConfig {
    fn default() -> Self {
        Self {
            normalization: Normalization::MaxSoFar,
            track_magnetometer: true,
        }
    }
}

/// Sample averaging window
#[derive(Debug)]
pub struct SampleAverager {
    /// Raw sample pool, sized for the largest window
    ring: Vec<Frame>,
    /// Active window size (power of two, at most `MAX_WINDOW`)
    window: usize,
    cursor: usize,
    accel_fresh: bool,
    mag_fresh: bool,
    track_magnetometer: bool,
    averaged: Frame,
    accel_normalizer: Normalizer,
    mag_normalizer: Normalizer,
}

impl SampleAverager {
    /// Create an averager with the given window size
    ///
    /// Sizes that are not a power of two up to `MAX_WINDOW` fall back to 1.
    pub fn new(window: usize, config: AveragerConfig) -> Self {
        let mut averager = Self {
            ring: vec![Frame::new(); MAX_WINDOW],
            window: 1,
            cursor: 0,
            accel_fresh: false,
            mag_fresh: false,
            track_magnetometer: config.track_magnetometer,
            averaged: Frame::new(),
            accel_normalizer: Normalizer::new(config.normalization, ACCEL_SPAN),
            mag_normalizer: Normalizer::new(config.normalization, MAG_SPAN),
        };
        averager.set_window(window);
        averager
    }

    /// Active window size
    pub fn window(&self) -> usize {
        self.window
    }

    /// Ring slot the next sample will be written to
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Change the window size
    ///
    /// Slot contents are kept; the cursor is folded into the new window.
    /// Returns `false` and changes nothing if the size is unsupported.
    pub fn set_window(&mut self, window: usize) -> bool {
        if !window.is_power_of_two() || window > MAX_WINDOW {
            return false;
        }
        if window != self.window {
            debug!("[AVG] Window {} -> {}", self.window, window);
            self.window = window;
            self.cursor %= window;
        }
        true
    }

    /// Normalize and store a raw accelerometer reading
    pub fn record_accelerometer(&mut self, x: f32, y: f32, z: f32, range_hint: Option<f32>) {
        let [x, y, z] = self.accel_normalizer.normalize([x, y, z], range_hint);
        self.store_accelerometer(x as i8, y as i8, z as i8);
    }

    /// Normalize and store a raw magnetometer reading
    pub fn record_magnetometer(&mut self, x: f32, y: f32, z: f32) {
        let [x, y, z] = self.mag_normalizer.normalize([x, y, z], None);
        self.store_magnetometer(x as i16, y as i16, z as i16);
    }

    /// Store an already quantized accelerometer sample in the current slot
    pub fn store_accelerometer(&mut self, x: i8, y: i8, z: i8) {
        self.ring[self.cursor].set_accelerometer(x, y, z);
        self.accel_fresh = true;
        self.advance_if_complete();
    }

    /// Store an already quantized magnetometer sample in the averaged frame
    pub fn store_magnetometer(&mut self, x: i16, y: i16, z: i16) {
        self.averaged.set_magnetometer(x, y, z);
        self.mag_fresh = true;
        self.advance_if_complete();
    }

    fn advance_if_complete(&mut self) {
        let mag_ready = self.mag_fresh || !self.track_magnetometer;
        if self.accel_fresh && mag_ready {
            self.cursor = (self.cursor + 1) % self.window;
            self.accel_fresh = false;
            self.mag_fresh = false;
        }
    }

    /// Average the first `window` slots into the output frame
    pub fn compute_average(&mut self) -> Frame {
        let n = self.window;
        let (mut sx, mut sy, mut sz) = (0i32, 0i32, 0i32);
        for frame in &self.ring[..n] {
            let a = frame.accelerometer();
            sx += a.x as i32;
            sy += a.y as i32;
            sz += a.z as i32;
        }
        let n = n as i32;
        self.averaged
            .set_accelerometer((sx / n) as i8, (sy / n) as i8, (sz / n) as i8);
        self.averaged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edroid_shared::codec::Axes;

    fn sample(averager: &mut SampleAverager, x: i8, y: i8, z: i8) {
        averager.store_accelerometer(x, y, z);
        averager.store_magnetometer(0, 0, 0);
    }

    #[test]
    fn test_average_of_two() {
        let mut averager = SampleAverager::new(2, AveragerConfig::default());
        sample(&mut averager, 10, 0, 0);
        sample(&mut averager, 20, 0, 0);
        assert_eq!(averager.compute_average().accelerometer().x, 15);
    }

    #[test]
    fn test_average_truncates_toward_zero() {
        let mut averager = SampleAverager::new(2, AveragerConfig::default());
        sample(&mut averager, -3, 3, 1);
        sample(&mut averager, -4, 4, 0);
        // -7/2, 7/2, 1/2
        assert_eq!(averager.compute_average().accelerometer(), Axes::new(-3, 3, 0));
    }

    #[test]
    fn test_unfilled_slots_count_as_zero() {
        let mut averager = SampleAverager::new(4, AveragerConfig::default());
        sample(&mut averager, 10, 0, 0);
        sample(&mut averager, 20, 0, 0);
        // (10 + 20 + 0 + 0) / 4
        assert_eq!(averager.compute_average().accelerometer().x, 7);
    }

    #[test]
    fn test_cursor_waits_for_both_groups() {
        let mut averager = SampleAverager::new(4, AveragerConfig::default());
        averager.store_accelerometer(1, 1, 1);
        averager.store_accelerometer(2, 2, 2);
        assert_eq!(averager.cursor(), 0);
        averager.store_magnetometer(5, 5, 5);
        assert_eq!(averager.cursor(), 1);
        // Slot 0 holds the latest accelerometer sample before the advance
        averager.set_window(1);
        assert_eq!(averager.compute_average().accelerometer(), Axes::new(2, 2, 2));
    }

    #[test]
    fn test_cursor_without_magnetometer() {
        let config = AveragerConfig {
            track_magnetometer: false,
            ..Default::default()
        };
        let mut averager = SampleAverager::new(2, config);
        averager.store_accelerometer(1, 0, 0);
        assert_eq!(averager.cursor(), 1);
        averager.store_accelerometer(2, 0, 0);
        assert_eq!(averager.cursor(), 0);
    }

    #[test]
    fn test_cursor_wraps_at_window_not_capacity() {
        let mut averager = SampleAverager::new(2, AveragerConfig::default());
        sample(&mut averager, 10, 0, 0);
        sample(&mut averager, 20, 0, 0);
        sample(&mut averager, 30, 0, 0);
        assert_eq!(averager.cursor(), 1);
        // Slot 0 overwritten by the third sample
        assert_eq!(averager.compute_average().accelerometer().x, 25);
    }

    #[test]
    fn test_average_ignores_slots_beyond_window() {
        let mut averager = SampleAverager::new(4, AveragerConfig::default());
        for x in [10, 20, 30, 40] {
            sample(&mut averager, x, 0, 0);
        }
        assert!(averager.set_window(2));
        assert_eq!(averager.compute_average().accelerometer().x, 15);
    }

    #[test]
    fn test_shrinking_window_folds_cursor() {
        let mut averager = SampleAverager::new(8, AveragerConfig::default());
        for _ in 0..5 {
            sample(&mut averager, 1, 1, 1);
        }
        assert_eq!(averager.cursor(), 5);
        averager.set_window(4);
        assert_eq!(averager.cursor(), 1);
    }

    #[test]
    fn test_rejects_unsupported_window() {
        let mut averager = SampleAverager::new(8, AveragerConfig::default());
        assert!(!averager.set_window(3));
        assert!(!averager.set_window(256));
        assert!(!averager.set_window(0));
        assert_eq!(averager.window(), 8);
        assert!(averager.set_window(128));
    }

    #[test]
    fn test_magnetometer_is_not_averaged() {
        let mut averager = SampleAverager::new(2, AveragerConfig::default());
        averager.store_accelerometer(0, 0, 0);
        averager.store_magnetometer(100, -100, 0);
        averager.store_accelerometer(0, 0, 0);
        averager.store_magnetometer(300, 50, -7);
        assert_eq!(
            averager.compute_average().magnetometer(),
            Axes::new(300, 50, -7)
        );
    }

    #[test]
    fn test_record_normalizes_max_so_far() {
        let mut averager = SampleAverager::new(2, AveragerConfig::default());
        averager.record_accelerometer(10.0, 5.0, 0.0, Some(100.0));
        averager.record_magnetometer(40.0, -20.0, 0.0);
        averager.record_accelerometer(20.0, 0.0, 0.0, Some(100.0));
        averager.record_magnetometer(40.0, 0.0, 0.0);
        let frame = averager.compute_average();
        // (127 + 127) / 2, (63 + 0) / 2
        assert_eq!(frame.accelerometer(), Axes::new(127, 31, 0));
        assert_eq!(frame.magnetometer(), Axes::new(2047, 0, 0));
    }

    #[test]
    fn test_record_normalizes_sensor_range() {
        let config = AveragerConfig {
            normalization: Normalization::SensorRange,
            track_magnetometer: false,
        };
        let mut averager = SampleAverager::new(1, config);
        averager.record_accelerometer(10.0, -5.0, 0.0, Some(20.0));
        assert_eq!(averager.compute_average().accelerometer(), Axes::new(63, -31, 0));
    }
}
