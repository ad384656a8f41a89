//! Per-group normalize-and-quantize transform

/// Quantized span of an accelerometer axis (signed 8-bit)
pub const ACCEL_SPAN: f32 = 127.0;

/// Quantized span of a magnetometer axis (fits the biased 16-bit field)
pub const MAG_SPAN: f32 = 2047.0;

/// How raw float readings are scaled before quantization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// Divide by the largest magnitude seen so far in the sensor group
    #[default]
    MaxSoFar,
    /// Divide by the sensor-reported maximum range, falling back to
    /// max-so-far for readings that arrive without a range hint
    SensorRange,
}

/// Running normalizer for one three-axis sensor group
#[derive(Debug, Clone)]
pub struct Normalizer {
    strategy: Normalization,
    span: f32,
    max_seen: f32,
}

impl Normalizer {
    pub fn new(strategy: Normalization, span: f32) -> Self {
        Self {
            strategy,
            span,
            max_seen: 0.0,
        }
    }

    /// Largest magnitude observed so far
    pub fn max_seen(&self) -> f32 {
        self.max_seen
    }

    /// Scale a reading into `-span..=span`, truncating toward zero
    pub fn normalize(&mut self, values: [f32; 3], range_hint: Option<f32>) -> [i32; 3] {
        for v in values {
            let magnitude = v.abs();
            if magnitude.is_finite() && magnitude > self.max_seen {
                self.max_seen = magnitude;
            }
        }

        let scale = match (self.strategy, range_hint) {
            (Normalization::SensorRange, Some(range)) if range.is_finite() && range > 0.0 => range,
            _ => self.max_seen,
        };

        values.map(|v| quantize(v, scale, self.span))
    }
}

fn quantize(value: f32, scale: f32, span: f32) -> i32 {
    if !value.is_finite() || scale <= 0.0 {
        return 0;
    }
    (value / scale * span).clamp(-span, span) as i32
}
