//! Sample pipeline between sensor callbacks and the frame emitter
//!
//! This module handles:
//! - Normalizing raw float readings into frame ranges
//! - Windowed averaging of accelerometer samples
//! - The callback surface sensor sources push into

pub mod averager;
pub mod feed;
pub mod normalize;
pub mod simulated;

pub use averager::{AveragerConfig, SampleAverager};
pub use feed::{lock_averager, SensorFeed, SharedAverager};
pub use normalize::Normalization;
pub use simulated::SimulatedSensor;
