//! Calibration Parameter Definitions
//!
//! # Parameters
//!
//! - `CAL_GYR_N` - Samples averaged for the gyro bias
//! - `CAL_ACC_N` - Samples averaged for the accel angle bias
//! - `CAL_GYR_DLY_MS` - Delay between gyro calibration samples
//! - `CAL_ACC_DLY_MS` - Delay between accel calibration samples

use super::error::ParameterError;
use super::storage::{ParamValue, ParameterStore};
use crate::orientation::calibration::{
    ACCEL_SAMPLE_DELAY_MS, DEFAULT_ACCEL_SAMPLES, DEFAULT_GYRO_SAMPLES, GYRO_SAMPLE_DELAY_MS,
};

const MIN_SAMPLES: i32 = 1;
const MAX_SAMPLES: i32 = 10_000;
const MAX_DELAY_MS: i32 = 1_000;

/// Calibration parameters loaded from parameter store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationParams {
    pub gyro_samples: u32,
    pub accel_samples: u32,
    pub gyro_delay_ms: u32,
    pub accel_delay_ms: u32,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            gyro_samples: DEFAULT_GYRO_SAMPLES,
            accel_samples: DEFAULT_ACCEL_SAMPLES,
            gyro_delay_ms: GYRO_SAMPLE_DELAY_MS,
            accel_delay_ms: ACCEL_SAMPLE_DELAY_MS,
        }
    }
}

impl CalibrationParams {
    /// Register calibration parameters with default values
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        store.register("CAL_GYR_N", ParamValue::Int(DEFAULT_GYRO_SAMPLES as i32))?;
        store.register("CAL_ACC_N", ParamValue::Int(DEFAULT_ACCEL_SAMPLES as i32))?;
        store.register("CAL_GYR_DLY_MS", ParamValue::Int(GYRO_SAMPLE_DELAY_MS as i32))?;
        store.register("CAL_ACC_DLY_MS", ParamValue::Int(ACCEL_SAMPLE_DELAY_MS as i32))?;
        Ok(())
    }

    /// Load calibration parameters from parameter store
    pub fn from_store(store: &ParameterStore) -> Self {
        let defaults = Self::default();
        let samples = |name: &str, default: u32| {
            store
                .get_i32(name)
                .map(|v| v.clamp(MIN_SAMPLES, MAX_SAMPLES) as u32)
                .unwrap_or(default)
        };
        let delay = |name: &str, default: u32| {
            store
                .get_i32(name)
                .map(|v| v.clamp(0, MAX_DELAY_MS) as u32)
                .unwrap_or(default)
        };

        Self {
            gyro_samples: samples("CAL_GYR_N", defaults.gyro_samples),
            accel_samples: samples("CAL_ACC_N", defaults.accel_samples),
            gyro_delay_ms: delay("CAL_GYR_DLY_MS", defaults.gyro_delay_ms),
            accel_delay_ms: delay("CAL_ACC_DLY_MS", defaults.accel_delay_ms),
        }
    }

    /// Validate calibration parameters
    pub fn is_valid(&self) -> bool {
        let samples = MIN_SAMPLES as u32..=MAX_SAMPLES as u32;
        samples.contains(&self.gyro_samples)
            && samples.contains(&self.accel_samples)
            && self.gyro_delay_ms <= MAX_DELAY_MS as u32
            && self.accel_delay_ms <= MAX_DELAY_MS as u32
    }
}
