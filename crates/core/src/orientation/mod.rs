//! Orientation source: unit conversion, absolute angles and calibration
//!
//! Converts raw 6-axis IMU counts into g, deg/s and gravity-derived roll and
//! pitch, and owns the static bias offsets subtracted from them.

pub mod calibration;
pub mod source;
pub mod types;

pub use calibration::{
    CalibrationError, CalibrationOffsets, CalibrationReport, ACCEL_SAMPLE_DELAY_MS,
    DEFAULT_ACCEL_SAMPLES, DEFAULT_GYRO_SAMPLES, GYRO_SAMPLE_DELAY_MS,
};
pub use source::{OrientationSource, ReadOutcome};
pub use types::{
    absolute_angles, ImuScale, OrientationEstimate, RawImuSample, ACCEL_LSB_PER_G, GYRO_LSB_PER_DPS,
};
