//! tiltrange_sitl - host-side bench for the tiltrange filter pipeline
//!
//! Drives the `tiltrange_core` orientation source, complementary filter and
//! ranging filter against seeded simulated sensors or a recorded log, on a
//! simulated clock, and streams the resulting telemetry lines.

pub mod error;
pub mod replay;
pub mod runner;
pub mod sensors;
pub mod time;

pub use error::SitlError;
pub use replay::{ReplayImu, ReplayLog, ReplayRanging, ReplayRecord};
pub use runner::{parameter_store, RunStats, SitlRunner, StepOutput, DEFAULT_PERIOD_US};
pub use sensors::{ImuSimConfig, MotionProfile, RangeSimConfig, SimulatedImu, SimulatedRanging};
pub use time::SitlClock;
