//! Parameter management types and utilities
//!
//! The in-memory `ParameterStore` plus one typed parameter group per tunable
//! component. Groups register their defaults, load themselves back with
//! range clamping, and hand the result to the component's `with_params`
//! constructor.

pub mod calibration;
pub mod error;
pub mod fusion;
pub mod imu;
pub mod ranging;
pub mod storage;

pub use calibration::CalibrationParams;
pub use error::ParameterError;
pub use fusion::FusionParams;
pub use imu::ImuParams;
pub use ranging::RangingParams;
pub use storage::{ParamValue, ParameterStore};
pub use storage::{MAX_PARAMS, PARAM_NAME_LEN};

/// Register every parameter group's defaults
pub fn register_all(store: &mut ParameterStore) -> Result<(), ParameterError> {
    FusionParams::register_defaults(store)?;
    RangingParams::register_defaults(store)?;
    CalibrationParams::register_defaults(store)?;
    ImuParams::register_defaults(store)?;
    Ok(())
}
