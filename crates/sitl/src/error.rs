use tiltrange_core::orientation::CalibrationError;
use tiltrange_core::parameters::ParameterError;

/// Errors that can occur while driving the simulated pipeline.
#[derive(Debug, thiserror::Error)]
pub enum SitlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Replay line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Calibration failed: {0}")]
    Calibration(CalibrationError),

    #[error("Parameter {name}: {error}")]
    Parameter { name: String, error: ParameterError },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<CalibrationError> for SitlError {
    fn from(e: CalibrationError) -> Self {
        Self::Calibration(e)
    }
}
