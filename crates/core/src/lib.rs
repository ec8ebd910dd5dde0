//! tiltrange_core - Pure no_std sensor fusion for a tilt and height sensor
//!
//! This crate contains the platform-agnostic signal path from raw IMU and
//! time-of-flight readings to a fused roll/pitch/height output. Everything
//! runs on host without hardware; sensors and clocks are injected via traits.
//!
//! # Modules
//!
//! - [`traits`]: Clock, IMU bus and ranging device abstractions plus mocks
//! - [`orientation`]: Unit conversion, absolute angles and bias calibration
//! - [`fusion`]: Complementary filter for roll and pitch
//! - [`ranging`]: Median and exponential smoothing of distance readings
//! - [`parameters`]: Parameter store and typed parameter groups
//! - [`telemetry`]: `roll,pitch,height` line formatting and parsing
//! - [`logging`]: Log macros forwarding to defmt on target

#![cfg_attr(not(test), no_std)]

pub mod logging;

pub mod fusion;
pub mod orientation;
pub mod parameters;
pub mod ranging;
pub mod telemetry;
pub mod traits;
