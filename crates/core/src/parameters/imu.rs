//! IMU Scale Parameter Definitions
//!
//! # Parameters
//!
//! - `IMU_ACC_LSB_G` - Accelerometer counts per g (4096 at ±8 g)
//! - `IMU_GYR_LSB_DPS` - Gyroscope counts per deg/s (65.5 at ±500 deg/s)

use super::error::ParameterError;
use super::storage::{ParamValue, ParameterStore};
use crate::orientation::types::{ImuScale, ACCEL_LSB_PER_G, GYRO_LSB_PER_DPS};

const MAX_ACCEL_LSB_PER_G: f32 = 65_536.0;
const MAX_GYRO_LSB_PER_DPS: f32 = 1_000.0;

/// IMU sensitivity parameters loaded from parameter store
#[derive(Debug, Clone, PartialEq)]
pub struct ImuParams {
    pub accel_lsb_per_g: f32,
    pub gyro_lsb_per_dps: f32,
}

impl Default for ImuParams {
    fn default() -> Self {
        Self {
            accel_lsb_per_g: ACCEL_LSB_PER_G,
            gyro_lsb_per_dps: GYRO_LSB_PER_DPS,
        }
    }
}

impl ImuParams {
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        store.register("IMU_ACC_LSB_G", ParamValue::Float(ACCEL_LSB_PER_G))?;
        store.register("IMU_GYR_LSB_DPS", ParamValue::Float(GYRO_LSB_PER_DPS))?;
        Ok(())
    }

    /// Load IMU parameters from parameter store
    ///
    /// A scale must be positive; zero, negative or non-finite values fall
    /// back to the default instead of clamping.
    pub fn from_store(store: &ParameterStore) -> Self {
        let scale = |name: &str, default: f32, max: f32| match store.get_f32(name) {
            Some(v) if v.is_finite() && v > 0.0 => v.min(max),
            Some(v) => {
                crate::log_warn!("{} = {} is not a positive scale, using default", name, v);
                default
            }
            None => default,
        };

        Self {
            accel_lsb_per_g: scale("IMU_ACC_LSB_G", ACCEL_LSB_PER_G, MAX_ACCEL_LSB_PER_G),
            gyro_lsb_per_dps: scale("IMU_GYR_LSB_DPS", GYRO_LSB_PER_DPS, MAX_GYRO_LSB_PER_DPS),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.accel_lsb_per_g > 0.0
            && self.accel_lsb_per_g <= MAX_ACCEL_LSB_PER_G
            && self.gyro_lsb_per_dps > 0.0
            && self.gyro_lsb_per_dps <= MAX_GYRO_LSB_PER_DPS
    }

    /// Conversion factors for the orientation source
    pub fn scale(&self) -> ImuScale {
        ImuScale {
            accel_lsb_per_g: self.accel_lsb_per_g,
            gyro_lsb_per_dps: self.gyro_lsb_per_dps,
        }
    }
}
