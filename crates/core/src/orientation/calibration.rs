//! Static bias calibration for gyro and accelerometer
//!
//! Offsets are averaged over N samples while the platform is held still
//! (gyro) or level (accelerometer). Nothing here can tell whether the
//! platform actually was still or level; that is the caller's job.

use core::fmt;

use nalgebra::Vector3;

use super::types::{absolute_angles, ImuScale, RawImuSample};

/// Default gyro calibration sample count
pub const DEFAULT_GYRO_SAMPLES: u32 = 500;

/// Default accelerometer calibration sample count
pub const DEFAULT_ACCEL_SAMPLES: u32 = 100;

/// Settle time between gyro calibration samples (ms)
pub const GYRO_SAMPLE_DELAY_MS: u32 = 5;

/// Settle time between accelerometer calibration samples (ms)
pub const ACCEL_SAMPLE_DELAY_MS: u32 = 10;

/// Static offsets subtracted from every sample.
///
/// Written only by the calibration routines and held for the session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationOffsets {
    /// Gyro roll (x) bias, deg/s
    pub gyro_roll: f32,
    /// Gyro pitch (y) bias, deg/s
    pub gyro_pitch: f32,
    /// Gyro yaw (z) bias, deg/s
    pub gyro_yaw: f32,
    /// Absolute roll bias, degrees
    pub accel_roll: f32,
    /// Absolute pitch bias, degrees
    pub accel_pitch: f32,
}

impl CalibrationOffsets {
    pub fn gyro_bias(&self) -> Vector3<f32> {
        Vector3::new(self.gyro_roll, self.gyro_pitch, self.gyro_yaw)
    }
}

/// Calibration failures that can actually be detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Sample count of zero; there is nothing to average
    NoSamples,
}

impl CalibrationError {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationError::NoSamples => "NoSamples",
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationError::NoSamples => write!(f, "calibration requested with zero samples"),
        }
    }
}

/// Summary of one calibration run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationReport {
    /// Samples averaged
    pub samples: u32,
    /// Reads that failed and fell back to the previous raw sample
    pub bus_failures: u32,
}

/// Running mean of raw gyro counts.
///
/// Sums stay in integer counts so N identical samples average back to
/// exactly that sample; conversion to deg/s happens once at the end.
#[derive(Debug, Clone, Default)]
pub struct GyroBiasAccumulator {
    sum: [i64; 3],
    count: u32,
}

impl GyroBiasAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, raw: &RawImuSample) {
        for (sum, &axis) in self.sum.iter_mut().zip(raw.gyro.iter()) {
            *sum += i64::from(axis);
        }
        self.count += 1;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Mean uncorrected rate in deg/s, `None` before the first sample
    pub fn mean_dps(&self, scale: &ImuScale) -> Option<Vector3<f32>> {
        if self.count == 0 {
            return None;
        }
        let n = f64::from(self.count);
        let k = 1.0 / scale.gyro_lsb_per_dps;
        let mean = |s: i64| (s as f64 / n) as f32 * k;
        Some(Vector3::new(
            mean(self.sum[0]),
            mean(self.sum[1]),
            mean(self.sum[2]),
        ))
    }
}

/// Running mean of uncorrected absolute roll and pitch
#[derive(Debug, Clone, Default)]
pub struct AngleBiasAccumulator {
    roll_sum: f64,
    pitch_sum: f64,
    count: u32,
}

impl AngleBiasAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, raw: &RawImuSample, scale: &ImuScale) {
        let (roll, pitch) = absolute_angles(&scale.accel_g(raw));
        self.roll_sum += f64::from(roll);
        self.pitch_sum += f64::from(pitch);
        self.count += 1;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Mean (roll, pitch) in degrees, `None` before the first sample
    pub fn mean_deg(&self) -> Option<(f32, f32)> {
        if self.count == 0 {
            return None;
        }
        let n = f64::from(self.count);
        Some(((self.roll_sum / n) as f32, (self.pitch_sum / n) as f32))
    }
}
