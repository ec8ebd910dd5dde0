//! Complementary Filter Parameter Definitions
//!
//! # Parameters
//!
//! - `CF_ALPHA` - Gyro weight per update, 0..1
//! - `CF_DT_MIN_US` - Shortest accepted update interval in microseconds
//! - `CF_DT_MAX_US` - Longest accepted update interval in microseconds
//! - `CF_SPIKE_DEG` - Gyro/accel disagreement reported as a spike, degrees

use super::error::ParameterError;
use super::storage::{ParamValue, ParameterStore};
use crate::fusion::complementary::{DEFAULT_ALPHA, MAX_DT_US, MIN_DT_US, SPIKE_THRESHOLD_DEG};

/// Upper bound for either dt guard
const MAX_DT_LIMIT_US: i32 = 1_000_000;

/// Upper bound for the spike threshold
const MAX_SPIKE_DEG: f32 = 180.0;

/// Complementary filter parameters loaded from parameter store
#[derive(Debug, Clone, PartialEq)]
pub struct FusionParams {
    /// Weight of the gyro-propagated angle
    pub alpha: f32,
    /// Intervals below this are discarded
    pub min_dt_us: u64,
    /// Intervals above this are discarded
    pub max_dt_us: u64,
    /// Disagreement above this is flagged on the update outcome
    pub spike_threshold_deg: f32,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            min_dt_us: MIN_DT_US,
            max_dt_us: MAX_DT_US,
            spike_threshold_deg: SPIKE_THRESHOLD_DEG,
        }
    }
}

impl FusionParams {
    /// Register fusion parameters with default values
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        store.register("CF_ALPHA", ParamValue::Float(DEFAULT_ALPHA))?;
        store.register("CF_DT_MIN_US", ParamValue::Int(MIN_DT_US as i32))?;
        store.register("CF_DT_MAX_US", ParamValue::Int(MAX_DT_US as i32))?;
        store.register("CF_SPIKE_DEG", ParamValue::Float(SPIKE_THRESHOLD_DEG))?;
        Ok(())
    }

    /// Load fusion parameters from parameter store
    ///
    /// Out-of-range values are clamped. Missing or non-numeric values fall
    /// back to defaults. An inverted dt window falls back to the default
    /// window.
    pub fn from_store(store: &ParameterStore) -> Self {
        let defaults = Self::default();

        let alpha = store
            .get_f32("CF_ALPHA")
            .filter(|v| v.is_finite())
            .map(|v| v.clamp(0.0, 1.0))
            .unwrap_or(defaults.alpha);

        let mut min_dt_us = store
            .get_i32("CF_DT_MIN_US")
            .map(|v| v.clamp(0, MAX_DT_LIMIT_US) as u64)
            .unwrap_or(defaults.min_dt_us);
        let mut max_dt_us = store
            .get_i32("CF_DT_MAX_US")
            .map(|v| v.clamp(0, MAX_DT_LIMIT_US) as u64)
            .unwrap_or(defaults.max_dt_us);
        if min_dt_us > max_dt_us {
            crate::log_warn!(
                "CF_DT_MIN_US {} above CF_DT_MAX_US {}, using defaults",
                min_dt_us,
                max_dt_us
            );
            min_dt_us = defaults.min_dt_us;
            max_dt_us = defaults.max_dt_us;
        }

        let spike_threshold_deg = store
            .get_f32("CF_SPIKE_DEG")
            .filter(|v| v.is_finite())
            .map(|v| v.clamp(0.0, MAX_SPIKE_DEG))
            .unwrap_or(defaults.spike_threshold_deg);

        Self {
            alpha,
            min_dt_us,
            max_dt_us,
            spike_threshold_deg,
        }
    }

    /// Validate fusion parameters
    pub fn is_valid(&self) -> bool {
        if !(0.0..=1.0).contains(&self.alpha) {
            return false;
        }

        if self.min_dt_us > self.max_dt_us || self.max_dt_us > MAX_DT_LIMIT_US as u64 {
            return false;
        }

        (0.0..=MAX_SPIKE_DEG).contains(&self.spike_threshold_deg)
    }
}
