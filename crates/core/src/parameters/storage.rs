//! Parameter Storage Types
//!
//! Provides the parameter value types and the in-memory `ParameterStore`
//! the typed parameter groups are registered in and loaded from.

use super::error::ParameterError;
use heapless::FnvIndexMap;
use heapless::String;

/// Maximum parameter name length
pub const PARAM_NAME_LEN: usize = 16;

/// Maximum number of parameters
pub const MAX_PARAMS: usize = 32;

/// Parameter value types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    /// Boolean parameter
    Bool(bool),
    /// 32-bit signed integer
    Int(i32),
    /// 32-bit floating point
    Float(f32),
}

impl ParamValue {
    /// Get type discriminant
    pub fn type_id(&self) -> u8 {
        match self {
            ParamValue::Bool(_) => 1,
            ParamValue::Int(_) => 2,
            ParamValue::Float(_) => 3,
        }
    }

    /// Parse `text` as a value of the same type as `self`
    pub fn parse_like(&self, text: &str) -> Result<ParamValue, ParameterError> {
        let text = text.trim();
        let value = match self {
            ParamValue::Bool(_) => match text {
                "1" | "true" => ParamValue::Bool(true),
                "0" | "false" => ParamValue::Bool(false),
                _ => return Err(ParameterError::InvalidValue),
            },
            ParamValue::Int(_) => {
                ParamValue::Int(text.parse().map_err(|_| ParameterError::InvalidValue)?)
            }
            ParamValue::Float(_) => {
                ParamValue::Float(text.parse().map_err(|_| ParameterError::InvalidValue)?)
            }
        };
        Ok(value)
    }
}

/// Parameter store for configuration management
///
/// Stores parameters as key-value pairs. Values keep the type they were
/// registered with.
pub struct ParameterStore {
    parameters: FnvIndexMap<String<PARAM_NAME_LEN>, ParamValue, MAX_PARAMS>,
}

fn key_for(name: &str) -> Result<String<PARAM_NAME_LEN>, ParameterError> {
    let mut key = String::<PARAM_NAME_LEN>::new();
    key.push_str(name)
        .map_err(|_| ParameterError::InvalidConfig)?;
    Ok(key)
}

impl ParameterStore {
    /// Create a new empty parameter store
    pub fn new() -> Self {
        Self {
            parameters: FnvIndexMap::new(),
        }
    }

    /// Get parameter value
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        let key = key_for(name).ok()?;
        self.parameters.get(&key)
    }

    /// Numeric value as `f32`, converting from `Int`
    pub fn get_f32(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f32),
            ParamValue::Bool(_) => None,
        }
    }

    /// Numeric value as `i32`, truncating from `Float`
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        match self.get(name)? {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(v) if v.is_finite() => Some(*v as i32),
            _ => None,
        }
    }

    /// Set parameter value
    ///
    /// The parameter must already be registered with the same value type.
    pub fn set(&mut self, name: &str, value: ParamValue) -> Result<(), ParameterError> {
        let key = key_for(name)?;

        let current = self
            .parameters
            .get(&key)
            .ok_or(ParameterError::InvalidConfig)?;
        if current.type_id() != value.type_id() {
            return Err(ParameterError::TypeMismatch);
        }

        self.parameters.insert(key, value).ok();
        Ok(())
    }

    /// Set a registered parameter from text, parsed as its registered type
    pub fn set_from_str(&mut self, name: &str, text: &str) -> Result<(), ParameterError> {
        let current = self.get(name).ok_or(ParameterError::InvalidConfig)?;
        let value = current.parse_like(text)?;
        self.set(name, value)
    }

    /// Register a new parameter with its default value
    ///
    /// If the parameter already exists, this is a no-op (idempotent).
    pub fn register(
        &mut self,
        name: &str,
        default_value: ParamValue,
    ) -> Result<(), ParameterError> {
        let key = key_for(name)?;

        if self.parameters.contains_key(&key) {
            // Already exists, don't overwrite
            return Ok(());
        }

        self.parameters
            .insert(key, default_value)
            .map_err(|_| ParameterError::StoreFull)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}
