//! Platform-agnostic trait abstractions.
//!
//! Filters depend on these seams instead of on a concrete bus, timer, or
//! sensor driver. Mock implementations are always compiled so host tests and
//! the simulator can drive the pipeline deterministically.

pub mod sensor;
pub mod time;

pub use sensor::{ImuBus, MockImu, MockRanging, RangingDevice, SensorError};
pub use time::{MockDelay, MockTime, TimeSource};
