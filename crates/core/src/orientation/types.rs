//! IMU sample types and unit conversion
//!
//! Raw counts come straight off a 6-axis MEMS IMU configured for ±8 g and
//! ±500 °/s. Everything downstream works in g, deg/s and degrees.

use libm::{atan2f, sqrtf};
use nalgebra::Vector3;

/// Accelerometer sensitivity at ±8 g full scale (LSB per g)
pub const ACCEL_LSB_PER_G: f32 = 4096.0;

/// Gyroscope sensitivity at ±500 °/s full scale (LSB per deg/s)
pub const GYRO_LSB_PER_DPS: f32 = 65.5;

/// Raw counts for one IMU sample.
///
/// Axis order is x, y, z for both sensors. Roll rate is the x gyro axis,
/// pitch rate the y axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawImuSample {
    pub accel: [i16; 3],
    pub gyro: [i16; 3],
}

impl RawImuSample {
    /// Length of a burst read covering accel, temperature and gyro registers
    pub const FRAME_LEN: usize = 14;

    pub const fn new(accel: [i16; 3], gyro: [i16; 3]) -> Self {
        Self { accel, gyro }
    }

    /// Decode a 14-byte big-endian burst frame.
    ///
    /// Layout: accel x/y/z, temperature, gyro x/y/z, two bytes each. The
    /// temperature word is skipped.
    pub fn from_be_bytes(frame: &[u8; Self::FRAME_LEN]) -> Self {
        let word = |i: usize| i16::from_be_bytes([frame[i], frame[i + 1]]);
        Self {
            accel: [word(0), word(2), word(4)],
            gyro: [word(8), word(10), word(12)],
        }
    }
}

/// Fixed sensitivity scales used to convert counts to physical units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuScale {
    /// Accelerometer LSB per g
    pub accel_lsb_per_g: f32,
    /// Gyroscope LSB per deg/s
    pub gyro_lsb_per_dps: f32,
}

impl Default for ImuScale {
    fn default() -> Self {
        Self {
            accel_lsb_per_g: ACCEL_LSB_PER_G,
            gyro_lsb_per_dps: GYRO_LSB_PER_DPS,
        }
    }
}

impl ImuScale {
    /// Acceleration in g (no bias applied)
    pub fn accel_g(&self, raw: &RawImuSample) -> Vector3<f32> {
        let k = 1.0 / self.accel_lsb_per_g;
        Vector3::new(
            f32::from(raw.accel[0]) * k,
            f32::from(raw.accel[1]) * k,
            f32::from(raw.accel[2]) * k,
        )
    }

    /// Angular rate in deg/s (no bias applied)
    pub fn rate_dps(&self, raw: &RawImuSample) -> Vector3<f32> {
        let k = 1.0 / self.gyro_lsb_per_dps;
        Vector3::new(
            f32::from(raw.gyro[0]) * k,
            f32::from(raw.gyro[1]) * k,
            f32::from(raw.gyro[2]) * k,
        )
    }
}

/// Roll and pitch in degrees from a gravity vector.
///
/// ```text
/// roll  = atan2( ay, sqrt(ax² + az²))
/// pitch = atan2(-ax, sqrt(ay² + az²))
/// ```
///
/// A zero vector yields (0, 0) since `atan2(0, 0)` is 0.
pub fn absolute_angles(accel_g: &Vector3<f32>) -> (f32, f32) {
    let (ax, ay, az) = (accel_g.x, accel_g.y, accel_g.z);
    let roll = atan2f(ay, sqrtf(ax * ax + az * az)).to_degrees();
    let pitch = atan2f(-ax, sqrtf(ay * ay + az * az)).to_degrees();
    (roll, pitch)
}

/// Physical-unit orientation data derived from one raw sample.
///
/// Recomputed from scratch on every sample; only the calibration offsets
/// carry over between samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationEstimate {
    /// Acceleration (g)
    pub accel_g: Vector3<f32>,
    /// Bias-corrected angular rate (deg/s): x = roll, y = pitch, z = yaw
    pub rate_dps: Vector3<f32>,
    /// Bias-corrected absolute roll from gravity (degrees)
    pub accel_roll: f32,
    /// Bias-corrected absolute pitch from gravity (degrees)
    pub accel_pitch: f32,
}

impl Default for OrientationEstimate {
    fn default() -> Self {
        Self {
            accel_g: Vector3::zeros(),
            rate_dps: Vector3::zeros(),
            accel_roll: 0.0,
            accel_pitch: 0.0,
        }
    }
}

impl OrientationEstimate {
    pub fn gyro_roll(&self) -> f32 {
        self.rate_dps.x
    }

    pub fn gyro_pitch(&self) -> f32 {
        self.rate_dps.y
    }

    pub fn gyro_yaw(&self) -> f32 {
        self.rate_dps.z
    }
}
