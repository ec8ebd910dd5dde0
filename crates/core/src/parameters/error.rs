//! Parameter error types
//!
//! Provides error types for parameter store operations.

/// Errors from parameter store operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParameterError {
    /// Invalid configuration (e.g., name too long, unknown parameter)
    InvalidConfig,
    /// Store is full
    StoreFull,
    /// New value has a different type than the registered one
    TypeMismatch,
    /// Text does not parse as the parameter's type
    InvalidValue,
}

impl ParameterError {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterError::InvalidConfig => "invalid parameter configuration",
            ParameterError::StoreFull => "parameter store full",
            ParameterError::TypeMismatch => "parameter type mismatch",
            ParameterError::InvalidValue => "invalid parameter value",
        }
    }
}

impl core::fmt::Display for ParameterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
