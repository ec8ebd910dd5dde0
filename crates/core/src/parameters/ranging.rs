//! Ranging Filter Parameter Definitions
//!
//! # Parameters
//!
//! - `TOF_BETA` - Weight of the newest median in the smoothed output, 0..1
//! - `TOF_MIN_MM` - Shortest accepted raw distance
//! - `TOF_MAX_MM` - Longest accepted raw distance
//! - `TOF_BAD_STATUS` - Range status code treated as invalid

use super::error::ParameterError;
use super::storage::{ParamValue, ParameterStore};
use crate::ranging::filter::DEFAULT_BETA;
use crate::ranging::types::{MAX_VALID_MM, MIN_VALID_MM, RANGE_STATUS_OUT_OF_RANGE};

/// Ranging filter parameters loaded from parameter store
#[derive(Debug, Clone, PartialEq)]
pub struct RangingParams {
    /// Smoothing weight of the newest median
    pub beta: f32,
    /// Inclusive lower bound in millimetres
    pub min_mm: u16,
    /// Inclusive upper bound in millimetres
    pub max_mm: u16,
    /// Status code rejected regardless of distance
    pub invalid_status: u8,
}

impl Default for RangingParams {
    fn default() -> Self {
        Self {
            beta: DEFAULT_BETA,
            min_mm: MIN_VALID_MM,
            max_mm: MAX_VALID_MM,
            invalid_status: RANGE_STATUS_OUT_OF_RANGE,
        }
    }
}

impl RangingParams {
    /// Register ranging parameters with default values
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        store.register("TOF_BETA", ParamValue::Float(DEFAULT_BETA))?;
        store.register("TOF_MIN_MM", ParamValue::Int(i32::from(MIN_VALID_MM)))?;
        store.register("TOF_MAX_MM", ParamValue::Int(i32::from(MAX_VALID_MM)))?;
        store.register("TOF_BAD_STATUS", ParamValue::Int(i32::from(RANGE_STATUS_OUT_OF_RANGE)))?;
        Ok(())
    }

    /// Load ranging parameters from parameter store
    ///
    /// Values are clamped to their field range; an inverted bounds pair
    /// falls back to the default bounds.
    pub fn from_store(store: &ParameterStore) -> Self {
        let defaults = Self::default();

        let beta = store
            .get_f32("TOF_BETA")
            .filter(|v| v.is_finite())
            .map(|v| v.clamp(0.0, 1.0))
            .unwrap_or(defaults.beta);

        let mut min_mm = store
            .get_i32("TOF_MIN_MM")
            .map(|v| v.clamp(0, i32::from(u16::MAX)) as u16)
            .unwrap_or(defaults.min_mm);
        let mut max_mm = store
            .get_i32("TOF_MAX_MM")
            .map(|v| v.clamp(0, i32::from(u16::MAX)) as u16)
            .unwrap_or(defaults.max_mm);
        if min_mm > max_mm {
            crate::log_warn!(
                "TOF_MIN_MM {} above TOF_MAX_MM {}, using defaults",
                min_mm,
                max_mm
            );
            min_mm = defaults.min_mm;
            max_mm = defaults.max_mm;
        }

        let invalid_status = store
            .get_i32("TOF_BAD_STATUS")
            .map(|v| v.clamp(0, i32::from(u8::MAX)) as u8)
            .unwrap_or(defaults.invalid_status);

        Self {
            beta,
            min_mm,
            max_mm,
            invalid_status,
        }
    }

    /// Validate ranging parameters
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.beta) && self.min_mm <= self.max_mm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranging_params_defaults() {
        let params = RangingParams::default();
        assert!((params.beta - 0.6).abs() < 0.001);
        assert_eq!(params.min_mm, 30);
        assert_eq!(params.max_mm, 2000);
        assert_eq!(params.invalid_status, 4);
        assert!(params.is_valid());
    }

    #[test]
    fn test_ranging_params_from_store() {
        let mut store = ParameterStore::new();
        RangingParams::register_defaults(&mut store).unwrap();
        assert_eq!(RangingParams::from_store(&store), RangingParams::default());
    }

    #[test]
    fn test_ranging_params_from_store_custom() {
        let mut store = ParameterStore::new();
        RangingParams::register_defaults(&mut store).unwrap();
        store.set("TOF_BETA", ParamValue::Float(0.3)).unwrap();
        store.set("TOF_MAX_MM", ParamValue::Int(4000)).unwrap();
        store.set("TOF_BAD_STATUS", ParamValue::Int(2)).unwrap();

        let params = RangingParams::from_store(&store);
        assert!((params.beta - 0.3).abs() < 0.001);
        assert_eq!(params.max_mm, 4000);
        assert_eq!(params.invalid_status, 2);
    }

    #[test]
    fn test_ranging_params_clamp() {
        let mut store = ParameterStore::new();
        RangingParams::register_defaults(&mut store).unwrap();
        store.set("TOF_BETA", ParamValue::Float(-1.0)).unwrap();
        store.set("TOF_MAX_MM", ParamValue::Int(100_000)).unwrap();
        store.set("TOF_BAD_STATUS", ParamValue::Int(300)).unwrap();

        let params = RangingParams::from_store(&store);
        assert_eq!(params.beta, 0.0);
        assert_eq!(params.max_mm, u16::MAX);
        assert_eq!(params.invalid_status, u8::MAX);
    }

    #[test]
    fn test_ranging_params_inverted_bounds_fall_back() {
        let mut store = ParameterStore::new();
        RangingParams::register_defaults(&mut store).unwrap();
        store.set("TOF_MIN_MM", ParamValue::Int(3000)).unwrap();

        let params = RangingParams::from_store(&store);
        assert_eq!(params.min_mm, 30);
        assert_eq!(params.max_mm, 2000);
    }

    #[test]
    fn test_ranging_params_validation() {
        let params = RangingParams {
            beta: 1.2,
            ..Default::default()
        };
        assert!(!params.is_valid());

        let params = RangingParams {
            min_mm: 2500,
            ..Default::default()
        };
        assert!(!params.is_valid());
    }
}
